//! Environment variable parsing with type safety.
//!
//! Provides a type-safe parser for PCODER_ environment variables with
//! validation, error collection, and source tracking. The parser reads from an
//! [`EnvSnapshot`] captured once per invocation rather than from the live
//! process environment, so every stage sees the same values.

use super::source::{ConfigSource, Sourced};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Path does not exist.
    #[error("Path not found for {var}: {path}")]
    PathNotFound { var: String, path: PathBuf },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

/// Immutable copy of the environment taken at the start of an invocation.
///
/// Nothing reads `std::env` after the snapshot is taken; launchers work on
/// clones of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables that are not valid
    /// UTF-8 are skipped.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value of `key` when it is set and not empty.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser<'a> {
    prefix: &'static str,
    env: &'a EnvSnapshot,
    errors: Vec<EnvError>,
}

impl<'a> EnvParser<'a> {
    /// Create a new parser with the PCODER_ prefix.
    pub fn new(env: &'a EnvSnapshot) -> Self {
        Self {
            prefix: "PCODER_",
            env,
            errors: Vec::new(),
        }
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    /// Get the full variable name with prefix.
    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn lookup(&self, var_name: &str) -> Option<String> {
        self.env.get(var_name).map(str::to_string)
    }

    /// Get a string value with default. Empty values fall back to the default.
    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if !value.is_empty() => Sourced::from_env(value, var_name),
            _ => Sourced::default_value(default.to_string()),
        }
    }

    /// Get a u64 value with default and range validation.
    pub fn get_u64_range(&mut self, name: &str, default: u64, min: u64, max: u64) -> Sourced<u64> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if value.is_empty() => Sourced::default_value(default),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(n) if n >= min && n <= max => Sourced::from_env(n, var_name),
                Ok(n) => {
                    self.errors.push(EnvError::OutOfRange {
                        var: var_name.clone(),
                        value: n.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                    Sourced::from_env(default, var_name)
                }
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name.clone(),
                        expected: format!("integer between {min} and {max}"),
                        value,
                    });
                    Sourced::default_value(default)
                }
            },
            None => Sourced::default_value(default),
        }
    }

    /// Get a path value with ~ expansion.
    ///
    /// If `must_exist` is true, records an error if the path doesn't exist.
    pub fn get_path(&mut self, name: &str, default: &str, must_exist: bool) -> Sourced<PathBuf> {
        let var_name = self.var_name(name);
        let (value, source) = match self.lookup(&var_name) {
            Some(v) if !v.is_empty() => (v, ConfigSource::Environment),
            _ => (default.to_string(), ConfigSource::Default),
        };

        let expanded = expand_tilde(&value);

        if must_exist && !expanded.exists() {
            self.errors.push(EnvError::PathNotFound {
                var: var_name.clone(),
                path: expanded.clone(),
            });
        }

        if source == ConfigSource::Environment {
            Sourced::from_env(expanded, var_name)
        } else {
            Sourced::default_value(expanded)
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) => {
                let lower = value.to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        Sourced::from_env(lower, var_name)
                    }
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var_name.clone(),
                            value: value.clone(),
                        });
                        Sourced::from_env(default.to_string(), var_name)
                    }
                }
            }
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get one of a closed set of lowercase choices.
    pub fn get_choice(&mut self, name: &str, default: &str, choices: &[&str]) -> Sourced<String> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if value.is_empty() => Sourced::default_value(default.to_string()),
            Some(value) => {
                let lower = value.trim().to_lowercase();
                if choices.contains(&lower.as_str()) {
                    Sourced::from_env(lower, var_name)
                } else {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name.clone(),
                        expected: format!("one of {}", choices.join("|")),
                        value,
                    });
                    Sourced::default_value(default.to_string())
                }
            }
            None => Sourced::default_value(default.to_string()),
        }
    }

    /// Get an optional string (None if not set or empty).
    pub fn get_optional_string(&mut self, name: &str) -> Sourced<Option<String>> {
        let var_name = self.var_name(name);
        match self.lookup(&var_name) {
            Some(value) if value.is_empty() => Sourced::from_env(None, var_name),
            Some(value) => Sourced::from_env(Some(value), var_name),
            None => Sourced::default_value(None),
        }
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(value)
}
