// src/options.rs

//! Recipe options
//!
//! Options are boolean build toggles declared by a recipe with a default
//! value (`shared`, `fPIC`). An option removed by `config_options` no longer
//! exists for the rest of the cook: reading or setting it is an error.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Parse an option value the way recipes and profiles spell booleans
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "True" | "true" | "1" | "ON" | "on" => Ok(true),
        "False" | "false" | "0" | "OFF" | "off" => Ok(false),
        other => Err(Error::InvalidOption(format!(
            "'{}' is not a boolean (expected True or False)",
            other
        ))),
    }
}

/// The live option values for one cook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    values: BTreeMap<String, bool>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from declared defaults
    pub fn from_defaults(defaults: &BTreeMap<String, bool>) -> Self {
        Self {
            values: defaults.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    /// Change the value of an existing option
    pub fn set(&mut self, name: &str, value: bool) -> Result<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::InvalidOption(format!("option '{}' doesn't exist", name))),
        }
    }

    /// Parse and apply a `name=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            Error::ParseError(format!("expected name=value, got '{}'", assignment))
        })?;
        self.set(name.trim(), parse_bool(value)?)
    }

    /// Remove an option; returns its last value
    pub fn remove(&mut self, name: &str) -> Option<bool> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(name, value)| format!("{}={}", name, if value { "True" } else { "False" }))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> BTreeMap<String, bool> {
        BTreeMap::from([("shared".to_string(), false), ("fPIC".to_string(), true)])
    }

    #[test]
    fn test_defaults() {
        let options = OptionSet::from_defaults(&defaults());
        assert_eq!(options.get("shared"), Some(false));
        assert_eq!(options.get("fPIC"), Some(true));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_override() {
        let mut options = OptionSet::from_defaults(&defaults());
        options.apply_override("shared=True").unwrap();
        assert_eq!(options.get("shared"), Some(true));

        assert!(options.apply_override("shared=maybe").is_err());
        assert!(options.apply_override("static=True").is_err());
        assert!(options.apply_override("shared").is_err());
    }

    #[test]
    fn test_removed_option_cannot_be_set() {
        let mut options = OptionSet::from_defaults(&defaults());
        assert_eq!(options.remove("fPIC"), Some(true));
        assert!(!options.contains("fPIC"));
        assert!(options.set("fPIC", false).is_err());
        assert_eq!(options.remove("fPIC"), None);
    }

    #[test]
    fn test_display() {
        let options = OptionSet::from_defaults(&defaults());
        assert_eq!(options.to_string(), "fPIC=True, shared=False");
    }
}
