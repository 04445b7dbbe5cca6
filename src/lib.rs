//! Module, settings and fixture registration for web application hosts.
//!
//! A host application is assembled from independently developed feature
//! **modules**. Each module brings its own default configuration, editable
//! settings, templates and seed data, and registers itself with an
//! [`Application`]:
//!
//! ```ignore
//! let mut app = Application::builder()
//!     .app_name("blog")
//!     .root_path(env!("CARGO_MANIFEST_DIR"))
//!     .search_paths(vec![SearchPath::Platform, SearchPath::Cwd])
//!     .build()?;
//!
//! let mut pages = Module::new("pages", "blog.pages", "modules/pages")
//!     .with_template_folder("templates");
//! pages.after_setup(|app| {
//!     tracing::info!(size = ?app.config().get("PAGE_SIZE"), "pages ready");
//!     Ok(())
//! });
//! app.register_module(pages)?;
//! app.use_plugin(SearchPlugin::default, "/var/lib/blog/index")?;
//! ```
//!
//! # Configuration
//!
//! All configuration lives in one [`ConfigStore`] of UPPERCASE constant keys.
//! The builder resolves it from these layers, lowest priority first:
//!
//! ```text
//! Instance files        {app_name}.toml in each search path, later paths win
//!        ↑ overridden by
//! Environment vars      PREFIX__KEY
//!        ↑ overridden by
//! Explicit values       .config(key, value)
//! ```
//!
//! Then two kinds of *defaults* are filled in, never replacing a key that is
//! already set:
//!
//! - framework boot defaults (`EXCLUDED_MODULES`, `DEFAULT_LOCALE`), at build
//!   time;
//! - each module's `defaults.toml`, when the module registers.
//!
//! Because defaults only fill gaps, an explicitly configured value is the same
//! whatever order modules register in. Typed access to a group of keys goes
//! through [`ConfigStore::section`]: `FORM_UPLOADS_PATH` becomes field
//! `uploads_path` of a confique struct loaded from namespace `FORM`.
//!
//! # Registering a module
//!
//! [`Application::register_module`] does three things, in order:
//!
//! 1. merges the module's defaults into the config (absent keys only);
//! 2. runs the module's finalize hooks ([`Module::after_setup`]) with
//!    `&mut Application`, stopping at the first error;
//! 3. records the module under its unique name.
//!
//! Modules of a package are registered through a [`ModulePackage`] manifest;
//! [`Application::register_package`] skips those listed in `EXCLUDED_MODULES`.
//!
//! # Settings
//!
//! Modules contribute user-editable [`SettingOption`]s through settings
//! providers. [`Application::provided_settings`] aggregates them across modules
//! (last option with a given name wins) and caches the result until the next
//! registration.
//!
//! # Templates
//!
//! [`Application::resolve_template`] searches the application's template
//! folder first, then the host framework's built-in templates, then each
//! module's template folder in registration order.
//!
//! # Plugins
//!
//! A [`Plugin`] is initialized with the application and then stored; it can be
//! fetched back by type with [`Application::plugin`]. A plugin that needs
//! module registration returns a [`Module`] from [`Plugin::as_module`], which
//! is registered right after `init_app`.
//!
//! # Fixtures
//!
//! [`Module::install_fixtures`] seeds a [`DataStore`] from the module's
//! `fixtures/data.json`, once per table.
//!
//! # Management commands
//!
//! [`AppAction`] covers `config list|get|set|unset`, `modules` and `settings`.
//! With the `clap` feature (default), [`AppArgs`] provides ready-made
//! subcommands. `config set` writes the instance file selected by
//! [`ApplicationBuilder::persist_path`], preserving comments.
//!
//! # Logging
//!
//! Registration, defaults merges, fixture installs and settings collisions are
//! reported as [`tracing`] events; install a subscriber to see them.

pub mod error;
pub mod fixtures;
pub mod settings;
pub mod templates;
pub mod types;

mod app;
mod boot;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
pub(crate) mod merge;
mod module;
mod ops;
mod persist;
mod plugin;
mod store;
mod validate;

#[cfg(test)]
mod testing;

pub use app::{Application, ApplicationBuilder, TEMPLATE_FOLDER};
pub use boot::BootConfig;
#[cfg(feature = "clap")]
pub use cli::{AppArgs, AppSubcommand, ConfigSubcommand};
pub use error::ModhostError;
pub use file::DEFAULTS_FILE_NAME;
pub use fixtures::{DataStore, FieldValue, FixtureReport, MemoryStore, Row, StoreError};
pub use module::{FinalizeHook, Module, ModulePackage};
pub use ops::AppResult;
pub use plugin::{Plugin, PluginRegistry};
pub use settings::{OptionKind, ProvidedSettings, SettingOption, SettingsProvider};
pub use store::ConfigStore;
pub use templates::{ChoiceLoader, FileSystemLoader, MemoryLoader, Template, TemplateLoader};
pub use types::{AppAction, SearchPath};
