//! Management operations: key lookup, listings, and the result type.
//!
//! Provides the logic behind `config list`, `config get`, `modules` and
//! `settings`, and the [`AppResult`] enum callers use to display results.

use std::fmt;

use toml::Value;

use crate::error::ModhostError;
use crate::module::Module;
use crate::settings::ProvidedSettings;
use crate::store::ConfigStore;

/// Result of a management operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum AppResult {
    /// One config key and its value.
    KeyValue { key: String, value: String },
    /// Confirmation that a value was persisted.
    ValueSet { key: String, value: String },
    /// Confirmation that a value was removed.
    ValueUnset { key: String },
    /// Every config key and its value, in store order.
    Listing { entries: Vec<(String, String)> },
    /// Registered modules as `(name, import_name)`, in registration order.
    Modules { entries: Vec<(String, String)> },
    /// Aggregated settings as `(module, name, value)`.
    Settings { entries: Vec<(String, String, String)> },
}

impl fmt::Display for AppResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppResult::KeyValue { key, value } => write!(f, "{key} = {value}"),
            AppResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            AppResult::ValueUnset { key } => write!(f, "Unset {key}"),
            AppResult::Listing { entries } => write_lines(f, entries, |f, (key, value)| {
                write!(f, "{key} = {value}")
            }),
            AppResult::Modules { entries } => write_lines(f, entries, |f, (name, import)| {
                write!(f, "{name} ({import})")
            }),
            AppResult::Settings { entries } => {
                write_lines(f, entries, |f, (module, name, value)| {
                    write!(f, "[{module}] {name} = {value}")
                })
            }
        }
    }
}

fn write_lines<T>(
    f: &mut fmt::Formatter<'_>,
    entries: &[T],
    mut line: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        line(f, entry)?;
    }
    Ok(())
}

/// Look up one config key.
pub fn get_value(store: &ConfigStore, key: &str) -> Result<AppResult, ModhostError> {
    let value = store
        .get(key)
        .ok_or_else(|| ModhostError::KeyNotFound(key.into()))?;
    Ok(AppResult::KeyValue {
        key: key.into(),
        value: format_value(value),
    })
}

pub fn list_values(store: &ConfigStore) -> AppResult {
    AppResult::Listing {
        entries: store
            .iter()
            .map(|(key, value)| (key.clone(), format_value(value)))
            .collect(),
    }
}

pub fn list_modules<'a>(modules: impl IntoIterator<Item = &'a Module>) -> AppResult {
    AppResult::Modules {
        entries: modules
            .into_iter()
            .map(|m| (m.name().to_string(), m.import_name().to_string()))
            .collect(),
    }
}

pub fn list_settings(settings: &ProvidedSettings) -> AppResult {
    AppResult::Settings {
        entries: settings
            .iter()
            .map(|option| {
                (
                    option.module.clone().unwrap_or_default(),
                    option.name.clone(),
                    format_value(&option.value),
                )
            })
            .collect(),
    }
}

/// Format a TOML value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => value.to_string(),
    }
}
