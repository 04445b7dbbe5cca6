//! Framework-level boot configuration.
//!
//! These keys are filled into every application's [`ConfigStore`] after the
//! instance files, environment and explicit values, so an application only
//! lists them when it wants something other than the default.

use confique::Config;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::ModhostError;
use crate::store::ConfigStore;

#[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
pub struct BootConfig {
    /// Module names or import names that `register_package` skips.
    #[config(default = [])]
    pub excluded_modules: Vec<String>,

    /// Locale used when a request does not pick one.
    #[config(default = "en")]
    pub default_locale: String,
}

impl BootConfig {
    /// Typed view of the boot keys currently in `store`.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ModhostError> {
        store.section("")
    }
}

/// The boot defaults as constant keys (`EXCLUDED_MODULES`, `DEFAULT_LOCALE`).
pub fn boot_defaults() -> Result<Table, ModhostError> {
    let config = BootConfig::builder().load()?;
    let value = Value::try_from(&config).map_err(|e| ModhostError::InvalidValue {
        key: "<boot>".into(),
        reason: e.to_string(),
    })?;
    let Value::Table(table) = value else {
        return Err(ModhostError::InvalidValue {
            key: "<boot>".into(),
            reason: "boot config did not serialize to a table".into(),
        });
    };
    Ok(table
        .into_iter()
        .map(|(key, value)| (key.to_uppercase(), value))
        .collect())
}
