//! Shared value types.
//!
//! [`SearchPath`] names a directory that may hold the application's instance
//! config file (`{app_name}.toml`). Paths are listed in **priority-ascending**
//! order; every file found is deep-merged, later files overriding earlier ones.
//! A typical layout puts a machine-wide file first and a deployment-local one
//! last:
//!
//! ```ignore
//! Application::builder()
//!     .app_name("blog")
//!     .search_paths(vec![SearchPath::Path("/etc/blog".into()), SearchPath::Cwd])
//!     .persist_path(SearchPath::Cwd)
//!     .build()?;
//! ```
//!
//! [`AppAction`] is a bootstrap-time management operation, independent of any
//! CLI framework. The optional clap adapter converts parsed args into one.

use std::path::PathBuf;

/// Where to search for instance config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".blog")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit absolute path.
    Path(PathBuf),
}

/// A management operation on a bootstrapped [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// List every config key and its value.
    ConfigList,
    /// Show one config key.
    ConfigGet { key: String },
    /// Persist a config value into the instance config file.
    ConfigSet { key: String, value: String },
    /// Remove a config value from the instance config file.
    ConfigUnset { key: String },
    /// List registered modules in registration order.
    Modules,
    /// List the aggregated editable settings.
    Settings,
}
