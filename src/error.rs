use std::path::PathBuf;

use thiserror::Error;

use crate::fixtures::StoreError;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum ModhostError {
    #[error("Key '{key}' in {path} (line {line}) is not a constant; use an UPPERCASE name")]
    NonConstantKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Non-constant keys in config file")]
    NonConstantKeys(Vec<ModhostError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Configuration error: {help}")]
    Configuration { help: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("A module named '{0}' is already registered")]
    DuplicateModule(String),

    #[error("A plugin named '{0}' is already installed")]
    DuplicatePlugin(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Error deserializing fixtures for: {module}")]
    BadlyFormattedFixture {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fixtures of '{module}' reference unknown model '{model}'")]
    UnknownModel { module: String, model: String },

    #[error("Invalid fixture value for '{field}' in '{module}': {reason}")]
    InvalidFixtureValue {
        module: String,
        field: String,
        reason: String,
    },

    #[error("Data store error: {0}")]
    Store(#[from] StoreError),

    #[error("No persist path configured; call .persist_path() on the builder")]
    NoPersistPath,

    #[error("App name is required; call .app_name() on the builder")]
    AppNameRequired,
}

impl ModhostError {
    /// Shorthand for a [`Configuration`](Self::Configuration) error.
    pub fn configuration(help: impl Into<String>) -> Self {
        Self::Configuration { help: help.into() }
    }
}
