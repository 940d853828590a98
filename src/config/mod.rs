// src/config/mod.rs

pub mod app;
pub mod environment;
pub mod global;
pub mod groups;
pub mod loader;
pub mod markup;
pub mod picture;
pub mod repository;
pub mod security;
pub mod server;
pub mod source;
pub mod time_format;
pub mod validation;

pub use app::{ConfigWarning, Settings};
pub use environment::{AppPaths, EnvironmentConfig};
pub use groups::LogLevel;
pub use loader::{check_lfs_version, load_core, LoadOptions};
pub use source::ConfigSource;
pub use time_format::TimeFormat;
pub use validation::ConfigValidator;
