// src/utils/mod.rs

pub mod crypto;
pub mod duration;
pub mod mail;

pub use crypto::SecureString;
pub use duration::{format_duration, parse_duration};
pub use mail::{parse_address, Mailbox};
