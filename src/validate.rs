//! Strict-mode validation: reject non-constant keys in config files.
//!
//! In lenient mode (the default) lowercase keys in a defaults or instance file
//! are simply not imported. In strict mode they are reported with the file path
//! and a best-effort line number, which catches `page_size = 5` typos that would
//! otherwise be silently dropped.

use std::path::Path;

use toml::Table;

use crate::error::ModhostError;
use crate::merge::is_constant_key;

/// Validate that every top-level key of `table` is a constant.
///
/// `content` is the source text `table` was parsed from; it is only used to
/// locate line numbers.
pub fn validate_constant_keys(
    table: &Table,
    content: &str,
    path: &Path,
) -> Result<(), ModhostError> {
    let errors: Vec<ModhostError> = table
        .keys()
        .filter(|key| !is_constant_key(key))
        .map(|key| ModhostError::NonConstantKey {
            key: key.clone(),
            path: path.to_path_buf(),
            line: find_key_line(content, key),
        })
        .collect();

    if errors.is_empty() {
        return Ok(());
    }
    Err(ModhostError::NonConstantKeys(errors))
}

/// Parse a config file into a table, reporting parse errors with its path.
pub fn parse_table(content: &str, path: &Path) -> Result<Table, ModhostError> {
    toml::from_str(content).map_err(|e| ModhostError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Find the 1-indexed line number of a top-level key in TOML content.
///
/// Matches `key = ...` assignments before the first section header, and
/// `[key]` section headers anywhere. Quoted keys and inline tables are not
/// handled. Returns 0 if the key cannot be located.
fn find_key_line(content: &str, key: &str) -> usize {
    let mut in_section = false;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']').trim();
            if header == key {
                return i + 1;
            }
            in_section = true;
            continue;
        }

        if !in_section
            && let Some(after_key) = trimmed.strip_prefix(key)
            && after_key.trim_start().starts_with('=')
        {
            return i + 1;
        }
    }
    0
}
