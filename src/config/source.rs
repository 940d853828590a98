//! Layered INI configuration source.
//!
//! Sections and keys are looked up ASCII case-insensitively, but the spelling
//! found in the file is kept so that enumerations (locale tables, key size
//! tables) see the original names. Appending another file overrides keys
//! that already exist and adds the rest.

use crate::error::{ConfigError, Result};
use crate::utils::parse_duration;
use ini::{EscapePolicy, Ini, ParseOption, WriteOption};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Name of the section holding keys that appear before any `[section]` header.
pub const DEFAULT_SECTION: &str = "";

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    /// Value with one pair of wrapping quotes removed.
    value: String,
    /// Value exactly as written in the file.
    raw: String,
}

#[derive(Debug, Clone)]
struct SectionData {
    name: String,
    entries: Vec<Entry>,
}

impl SectionData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value.as_str())
    }

    fn set_raw(&mut self, key: &str, raw: &str) {
        let value = unquote(raw).to_string();
        match self.entries.iter_mut().find(|e| e.key.eq_ignore_ascii_case(key)) {
            Some(entry) => {
                entry.value = value;
                entry.raw = raw.to_string();
            }
            None => self.entries.push(Entry {
                key: key.to_string(),
                value,
                raw: raw.to_string(),
            }),
        }
    }
}

/// Strips one pair of quotes wrapping the whole value. Double and single
/// quotes only count when the value holds no other quote of the same kind;
/// backticks always wrap verbatim text.
fn unquote(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 {
        return raw;
    }
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    if !matches!(first, b'"' | b'\'' | b'`') || last != first {
        return raw;
    }
    let inner = &raw[1..raw.len() - 1];
    if first != b'`' && inner.as_bytes().contains(&first) {
        return raw;
    }
    inner
}

/// An ordered, mergeable set of INI sections.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    sections: Vec<SectionData>,
}

impl ConfigSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a single file into a new source.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut source = Self::new();
        source.append_file(path)?;
        Ok(source)
    }

    /// Parses `path` and merges it on top of the current content.
    pub fn append_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.append_str(&text, path)?;
        debug!(config.path = %path.display(), sections = self.sections.len(), "Merged configuration file");
        Ok(())
    }

    /// Parses INI text and merges it on top of the current content.
    ///
    /// `origin` is only used in error messages.
    pub fn append_str(&mut self, text: &str, origin: &Path) -> Result<()> {
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, option).map_err(|e| ConfigError::ConfigParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        for (section, properties) in ini.iter() {
            let name = section.unwrap_or(DEFAULT_SECTION);
            if properties.is_empty() && name == DEFAULT_SECTION {
                continue;
            }
            let data = self.section_entry(name);
            for (key, value) in properties.iter() {
                data.set_raw(key, value);
            }
        }
        Ok(())
    }

    fn find(&self, name: &str) -> Option<&SectionData> {
        self.sections.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn section_entry(&mut self, name: &str) -> &mut SectionData {
        let index = match self.sections.iter().position(|s| s.name.eq_ignore_ascii_case(name)) {
            Some(index) => index,
            None => {
                self.sections.push(SectionData::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    /// Returns a view of the named section. Missing sections behave as empty.
    pub fn section<'a>(&'a self, name: &'a str) -> Section<'a> {
        Section {
            name,
            data: self.find(name),
        }
    }

    /// Enumerates `parent.<child>` sections in load order.
    pub fn child_sections<'a>(&'a self, parent: &str) -> Vec<Section<'a>> {
        self.sections
            .iter()
            .filter(|s| {
                matches!(s.name.get(..parent.len()), Some(head) if head.eq_ignore_ascii_case(parent))
                    && s.name.as_bytes().get(parent.len()) == Some(&b'.')
            })
            .map(|s| Section {
                name: s.name.as_str(),
                data: Some(s),
            })
            .collect()
    }

    /// Sets a key, creating the section if needed. The value is written
    /// back verbatim by [`ConfigSource::save_to`].
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.section_entry(section).set_raw(key, value);
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        if let Some(default) = self.find(DEFAULT_SECTION) {
            for entry in &default.entries {
                ini.with_section(None::<String>).set(entry.key.as_str(), entry.raw.as_str());
            }
        }
        for section in self.sections.iter().filter(|s| s.name != DEFAULT_SECTION) {
            let mut setter = ini.with_section(Some(section.name.as_str()));
            for entry in &section.entries {
                setter.set(entry.key.as_str(), entry.raw.as_str());
            }
        }
        ini
    }

    fn write_option() -> WriteOption {
        WriteOption {
            escape_policy: EscapePolicy::Nothing,
            ..WriteOption::default()
        }
    }

    /// Writes every section to `path`, replacing the file. Values keep the
    /// quoting they were read with.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.to_ini()
            .write_to_file_opt(path, Self::write_option())
            .map_err(|e| ConfigError::io("write config", path, e))
    }
}

impl FromStr for ConfigSource {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self> {
        let mut source = Self::new();
        source.append_str(text, Path::new("<memory>"))?;
        Ok(source)
    }
}

/// A read-only view of one section.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    name: &'a str,
    data: Option<&'a SectionData>,
}

impl<'a> Section<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn key(&self, name: &str) -> Key<'a> {
        Key {
            section: self.name,
            name: name.to_string(),
            value: self.data.and_then(|d| d.get(name)),
        }
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.data.map_or(false, |d| d.get(name).is_some())
    }

    /// All key/value pairs with their original spelling, in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.data
            .into_iter()
            .flat_map(|d| d.entries.iter().map(|e| (e.key.as_str(), e.value.as_str())))
    }

    pub fn keys_hash(&self) -> BTreeMap<String, String> {
        self.entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

/// A single key lookup with typed accessors.
///
/// Every `must_*` accessor falls back to its default when the key is absent
/// or its value does not parse.
#[derive(Debug, Clone)]
pub struct Key<'a> {
    section: &'a str,
    name: String,
    value: Option<&'a str>,
}

impl<'a> Key<'a> {
    pub fn section(&self) -> &'a str {
        self.section
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw value, if the key is present.
    pub fn value(&self) -> Option<&'a str> {
        self.value
    }

    /// The raw value, or an empty string.
    pub fn string(&self) -> String {
        self.value.unwrap_or_default().to_string()
    }

    pub fn must_string(&self, default: &str) -> String {
        match self.value {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn must_bool(&self, default: bool) -> bool {
        self.value.and_then(parse_bool).unwrap_or(default)
    }

    pub fn must_int<T: FromStr>(&self, default: T) -> T {
        self.value
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default)
    }

    pub fn must_duration(&self, default: Duration) -> Duration {
        self.value.and_then(parse_duration).unwrap_or(default)
    }

    /// Splits the value on `delim`, trimming every item. An empty value yields
    /// an empty list; empty items inside the list are kept.
    pub fn strings(&self, delim: char) -> Vec<String> {
        match self.value {
            Some(v) if !v.is_empty() => v.split(delim).map(|s| s.trim().to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Like [`Key::strings`], but an absent or empty value yields `default`.
    pub fn must_strings(&self, delim: char, default: &[&str]) -> Vec<String> {
        match self.strings(delim) {
            list if list.is_empty() => default.iter().map(|s| s.to_string()).collect(),
            list => list,
        }
    }

    /// Returns the value when it is one of `candidates`, otherwise `default`.
    pub fn in_values(&self, default: &str, candidates: &[&str]) -> String {
        match self.value {
            Some(v) if candidates.contains(&v) => v.to_string(),
            _ => default.to_string(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}
