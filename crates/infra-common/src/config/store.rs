use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::types::{Error, Result};

/// Values of one configuration section, keyed by entry name
pub type Section = BTreeMap<String, String>;

/// Sectioned key/value configuration
///
/// Mirrors the classic `[section] key = value` layout used to persist SIP
/// stack settings. Values are kept as strings; typed accessors parse them
/// on read. Lists are stored comma separated.
///
/// The TOML representation quotes every value, so a section looks like:
///
/// ```text
/// [auth_info_0]
/// username = "alice"
/// realm = "sip.example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigStore {
    sections: BTreeMap<String, Section>,
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; scalar values of any type are kept as strings
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, toml::Value>> = toml::from_str(document)?;
        let mut store = Self::new();
        for (name, entries) in raw {
            let section = store.sections.entry(name.clone()).or_default();
            for (key, value) in entries {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Boolean(b) => if b { "1".to_string() } else { "0".to_string() },
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Array(items) => items
                        .iter()
                        .map(|item| match item {
                            toml::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    other => {
                        return Err(Error::Parse(format!(
                            "Unsupported value for [{}] {}: {}",
                            name, key, other
                        )))
                    }
                };
                section.insert(key, value);
            }
        }
        Ok(store)
    }

    /// Render the store as a TOML document
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(&self.sections)?)
    }

    /// Load a store from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loading configuration");
        Self::from_toml_str(&document)
    }

    /// Write the store to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)?;
        debug!(path = %path.display(), sections = self.sections.len(), "Saved configuration");
        Ok(())
    }

    /// Whether the section exists (possibly empty)
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Names of all sections, sorted
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Entries of one section
    pub fn section(&self, section: &str) -> Option<&Section> {
        self.sections.get(section)
    }

    /// Remove a section and all its entries
    pub fn clean_section(&mut self, section: &str) {
        self.sections.remove(section);
    }

    pub fn get_string(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    pub fn get_string_or<'a>(&'a self, section: &str, key: &str, default: &'a str) -> &'a str {
        self.get_string(section, key).unwrap_or(default)
    }

    /// Integer entry; unparsable values fall back to `default`
    pub fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Boolean entry: `0`/`false`/`no` are false, other integers and `true`/`yes` are true
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.get_string(section, key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" || v == "yes" => true,
            Some(v) if v == "false" || v == "no" => false,
            Some(v) => v.parse::<i64>().map(|i| i != 0).unwrap_or(default),
            None => default,
        }
    }

    /// Comma separated list entry, empty items dropped
    pub fn get_string_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn set_string(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn set_int(&mut self, section: &str, key: &str, value: i64) {
        self.set_string(section, key, value.to_string());
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set_string(section, key, if value { "1" } else { "0" });
    }

    pub fn set_string_list<S: AsRef<str>>(&mut self, section: &str, key: &str, values: &[S]) {
        let joined = values.iter().map(|v| v.as_ref()).collect::<Vec<_>>().join(",");
        self.set_string(section, key, joined);
    }

    /// Remove a single entry, returning its previous value
    pub fn remove_key(&mut self, section: &str, key: &str) -> Option<String> {
        self.sections.get_mut(section)?.remove(key)
    }
}
