//! The process-wide configuration mapping.
//!
//! [`ConfigStore`] keeps keys in insertion order and distinguishes two kinds of
//! writes:
//!
//! - **explicit** writes ([`set`](ConfigStore::set), [`merge`](ConfigStore::merge))
//!   always win;
//! - **defaults** ([`fill_defaults`](ConfigStore::fill_defaults),
//!   [`fill_from_module_defaults`](ConfigStore::fill_from_module_defaults)) only
//!   fill keys that are still absent, and only constant (UPPERCASE) keys.
//!
//! Because defaults never replace anything, the final value of an explicitly
//! set key does not depend on the order in which modules register.
//!
//! Typed access goes through [`section`](ConfigStore::section): the keys of a
//! namespace are trimmed and lowercased (`FORM_UPLOADS_PATH` becomes
//! `uploads_path` in section `FORM`) and handed to a confique struct, which
//! fills its own `#[config(default)]` values and checks required fields.

use std::path::Path;

use confique::Config;
use serde::Deserialize;
use toml::{Table, Value};
use tracing::debug;

use crate::error::ModhostError;
use crate::file;
use crate::merge::{deep_merge, fill_absent};
use crate::validate;

/// Ordered key → value configuration mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    values: Table,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(values: Table) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// String value of `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Explicitly set `key`, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Deep-merge an explicit layer on top of the current values.
    pub fn merge(&mut self, overlay: Table) {
        let base = std::mem::take(&mut self.values);
        self.values = deep_merge(base, overlay);
    }

    /// Fill absent constant keys from `defaults`. Returns the keys filled.
    pub fn fill_defaults(&mut self, defaults: Table) -> Vec<String> {
        fill_absent(&mut self.values, defaults)
    }

    /// Fill absent keys from the `defaults.toml` of the module rooted at `root_path`.
    ///
    /// A module rooted at a file reads the defaults of its parent directory. A
    /// missing defaults file means "no defaults". With `strict`, non-constant
    /// keys fail with their line number instead of being skipped.
    pub fn fill_from_module_defaults(
        &mut self,
        root_path: &Path,
        strict: bool,
    ) -> Result<Vec<String>, ModhostError> {
        let filled = self.fill_defaults(module_defaults(root_path, strict)?);
        debug!(root = %root_path.display(), ?filled, "merged module defaults");
        Ok(filled)
    }

    /// Value of a key that setup cannot continue without.
    pub fn require(&self, key: &str) -> Result<&Value, ModhostError> {
        self.get(key).ok_or_else(|| {
            ModhostError::configuration(format!(
                "`{key}` is not defined. Please add it to your application config."
            ))
        })
    }

    /// Keys under `namespace`, trimmed of the `{namespace}_` prefix and lowercased.
    ///
    /// An empty namespace selects every key.
    pub fn namespace(&self, namespace: &str) -> Table {
        let prefix = format!("{namespace}_");
        self.values
            .iter()
            .filter_map(|(key, value)| {
                let trimmed = if namespace.is_empty() {
                    key.as_str()
                } else {
                    key.strip_prefix(&prefix)?
                };
                (!trimmed.is_empty()).then(|| (trimmed.to_lowercase(), value.clone()))
            })
            .collect()
    }

    /// Deserialize the keys of `namespace` into a typed confique config.
    ///
    /// Keys the section does not consume are logged, not rejected: a namespace
    /// is shared by everything whose keys happen to start with it.
    pub fn section<C: Config>(&self, namespace: &str) -> Result<C, ModhostError>
    where
        C::Layer: for<'de> Deserialize<'de>,
    {
        let mut unused: Vec<String> = Vec::new();
        let layer: C::Layer =
            serde_ignored::deserialize(Value::Table(self.namespace(namespace)), |path| {
                unused.push(path.to_string());
            })
            .map_err(|e: toml::de::Error| ModhostError::InvalidValue {
                key: format!("{namespace}_*"),
                reason: e.to_string(),
            })?;

        if !unused.is_empty() {
            debug!(namespace, ?unused, "config keys not consumed by section");
        }

        C::builder()
            .preloaded(layer)
            .load()
            .map_err(ModhostError::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_table(&self) -> &Table {
        &self.values
    }
}

/// Parse the `defaults.toml` of the module rooted at `root_path`.
///
/// A missing file gives an empty table. Non-constant keys are kept here and
/// dropped by the fill; with `strict` they fail with their line number.
pub(crate) fn module_defaults(root_path: &Path, strict: bool) -> Result<Table, ModhostError> {
    let Some((path, content)) = file::load_defaults(root_path)? else {
        debug!(root = %root_path.display(), "no module defaults");
        return Ok(Table::new());
    };
    let table = validate::parse_table(&content, &path)?;
    if strict {
        validate::validate_constant_keys(&table, &content, &path)?;
    }
    Ok(table)
}
