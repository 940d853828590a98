//! `[time] FORMAT`: named reference layouts or a custom layout written with
//! the reference date `Mon Jan 2 15:04:05 MST 2006`.

use crate::error::{ConfigError, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use tracing::trace;

pub const ANSIC: &str = "Mon Jan _2 15:04:05 2006";
pub const UNIX_DATE: &str = "Mon Jan _2 15:04:05 MST 2006";
pub const RUBY_DATE: &str = "Mon Jan 02 15:04:05 -0700 2006";
pub const RFC822: &str = "02 Jan 06 15:04 MST";
pub const RFC822Z: &str = "02 Jan 06 15:04 -0700";
pub const RFC850: &str = "Monday, 02-Jan-06 15:04:05 MST";
pub const RFC1123: &str = "Mon, 02 Jan 2006 15:04:05 MST";
pub const RFC1123Z: &str = "Mon, 02 Jan 2006 15:04:05 -0700";
pub const RFC3339: &str = "2006-01-02T15:04:05Z07:00";
pub const RFC3339_NANO: &str = "2006-01-02T15:04:05.999999999Z07:00";
pub const KITCHEN: &str = "3:04PM";
pub const STAMP: &str = "Jan _2 15:04:05";
pub const STAMP_MILLI: &str = "Jan _2 15:04:05.000";
pub const STAMP_MICRO: &str = "Jan _2 15:04:05.000000";
pub const STAMP_NANO: &str = "Jan _2 15:04:05.000000000";

pub const DEFAULT_FORMAT: &str = "RFC1123";

/// The reference instant every custom layout must reproduce.
const REFERENCE_RFC3339: &str = "2006-01-02T15:04:05Z";

const NAMED_LAYOUTS: &[(&str, &str)] = &[
    ("ANSIC", ANSIC),
    ("UnixDate", UNIX_DATE),
    ("RubyDate", RUBY_DATE),
    ("RFC822", RFC822),
    ("RFC822Z", RFC822Z),
    ("RFC850", RFC850),
    ("RFC1123", RFC1123),
    ("RFC1123Z", RFC1123Z),
    ("RFC3339", RFC3339),
    ("RFC3339Nano", RFC3339_NANO),
    ("Kitchen", KITCHEN),
    ("Stamp", STAMP),
    ("StampMilli", STAMP_MILLI),
    ("StampMicro", STAMP_MICRO),
    ("StampNano", STAMP_NANO),
];

// Longer tokens come first where they share a prefix.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("Z07:00", "%:z"),
    ("Z0700", "%z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    (".000000000", "%.9f"),
    (".000000", "%.6f"),
    (".000", "%.3f"),
    (".999999999", "%.f"),
    (".999999", "%.f"),
    (".999", "%.f"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("_2", "%e"),
    ("15", "%H"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
    ("PM", "%p"),
    ("pm", "%P"),
];

/// Rewrites a reference-date layout into a `chrono` format string.
pub fn to_strftime(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'scan: while let Some(c) = rest.chars().next() {
        for (token, spec) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'scan;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Parses `layout` with itself and renders the result as RFC 3339.
fn round_trip(layout: &str) -> Option<String> {
    let pattern = to_strftime(layout);
    if let Ok(parsed) = DateTime::parse_from_str(layout, &pattern) {
        return Some(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }
    NaiveDateTime::parse_from_str(layout, &pattern)
        .ok()
        .map(|naive| naive.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeFormat {
    /// The configured value, a layout name or a custom layout.
    pub key: String,
    /// Reference-date layout.
    pub layout: String,
    /// Equivalent `chrono` format string.
    pub strftime: String,
}

impl TimeFormat {
    /// Resolves a named layout, or validates `key` as a custom layout.
    pub fn from_config(key: &str) -> Result<Self> {
        let layout = match NAMED_LAYOUTS.iter().find(|(name, _)| *name == key) {
            Some((_, layout)) => layout.to_string(),
            None => {
                if round_trip(key).as_deref() != Some(REFERENCE_RFC3339) {
                    return Err(ConfigError::TimeFormat {
                        layout: key.to_string(),
                    });
                }
                trace!(time.format = key, "Custom time format");
                key.to_string()
            }
        };
        Ok(Self {
            key: key.to_string(),
            strftime: to_strftime(&layout),
            layout,
        })
    }

    pub fn format<Tz>(&self, time: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        time.format(&self.strftime).to_string()
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            key: DEFAULT_FORMAT.to_string(),
            layout: RFC1123.to_string(),
            strftime: to_strftime(RFC1123),
        }
    }
}
