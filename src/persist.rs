//! Config persistence: patch instance config files while preserving formatting.
//!
//! Uses `toml_edit` for comment-preserving edits. Keys are flat constants, so
//! every write lands at the top level of the document. Creates the file and
//! its parent directories as needed.

use std::path::Path;

use toml::Value;
use toml_edit::DocumentMut;

use crate::env::parse_env_value;
use crate::error::ModhostError;
use crate::file;
use crate::merge::is_constant_key;
use crate::ops::AppResult;

/// Parse a raw command-line value with the same heuristics as env vars.
pub fn parse_value(raw: &str) -> Value {
    parse_env_value(raw)
}

fn check_key(key: &str) -> Result<(), ModhostError> {
    if is_constant_key(key) {
        Ok(())
    } else {
        Err(ModhostError::InvalidValue {
            key: key.into(),
            reason: "config keys are UPPERCASE constants".into(),
        })
    }
}

fn parse_document(content: Option<&str>, key: &str) -> Result<DocumentMut, ModhostError> {
    content
        .unwrap_or_default()
        .parse()
        .map_err(|e: toml_edit::TomlError| ModhostError::InvalidValue {
            key: key.into(),
            reason: e.to_string(),
        })
}

fn edit_value(value: &Value) -> Option<toml_edit::Value> {
    Some(match value {
        Value::String(s) => s.as_str().into(),
        Value::Integer(i) => (*i).into(),
        Value::Float(f) => (*f).into(),
        Value::Boolean(b) => (*b).into(),
        _ => return None,
    })
}

/// Pure function: set `key` to `value` in a TOML document string.
///
/// `None` content means the file does not exist yet.
pub fn set_in_document(content: Option<&str>, key: &str, value: &Value) -> Result<String, ModhostError> {
    check_key(key)?;
    let mut doc = parse_document(content, key)?;
    let item = edit_value(value).ok_or_else(|| ModhostError::InvalidValue {
        key: key.into(),
        reason: "only scalar values can be set".into(),
    })?;
    doc[key] = toml_edit::value(item);
    Ok(doc.to_string())
}

/// Pure function: remove `key` from a TOML document string.
///
/// Returns the new document, or `None` if the key was not present.
pub fn unset_in_document(content: &str, key: &str) -> Result<Option<String>, ModhostError> {
    let mut doc = parse_document(Some(content), key)?;
    Ok(doc.remove(key).map(|_| doc.to_string()))
}

fn write(path: &Path, content: &str) -> Result<(), ModhostError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ModhostError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| ModhostError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read the file (if it exists), set the key, write it back.
pub fn persist_value(path: &Path, key: &str, value: &Value) -> Result<AppResult, ModhostError> {
    let content = file::read_optional(path)?;
    let new_content = set_in_document(content.as_deref(), key, value)?;
    write(path, &new_content)?;
    Ok(AppResult::ValueSet {
        key: key.into(),
        value: crate::ops::format_value(value),
    })
}

/// Remove a key from the file. A missing file or key is [`ModhostError::KeyNotFound`].
pub fn unset_value(path: &Path, key: &str) -> Result<AppResult, ModhostError> {
    let content = file::read_optional(path)?.ok_or_else(|| ModhostError::KeyNotFound(key.into()))?;
    let new_content =
        unset_in_document(&content, key)?.ok_or_else(|| ModhostError::KeyNotFound(key.into()))?;
    write(path, &new_content)?;
    Ok(AppResult::ValueUnset { key: key.into() })
}
