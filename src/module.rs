//! Feature modules.
//!
//! A [`Module`] is an independently developed unit of functionality: it has a
//! unique name, a root path on disk (where its `defaults.toml`, templates and
//! fixtures live), settings providers and finalize hooks. Modules are built by
//! their authors and handed to
//! [`Application::register_module`](crate::Application::register_module), or
//! listed in a [`ModulePackage`] manifest.
//!
//! ```ignore
//! let mut pages = Module::new("pages", "blog.pages", env!("CARGO_MANIFEST_DIR"))
//!     .with_template_folder("templates");
//! pages.settings_provider(|| vec![SettingOption::new("title", "Site title", OptionKind::Text, "")]);
//! pages.after_setup(|app| {
//!     let size = app.config().require("PAGE_SIZE")?.clone();
//!     tracing::info!(%size, "pages ready");
//!     Ok(())
//! });
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::app::Application;
use crate::error::ModhostError;
use crate::file;
use crate::fixtures::{self, DataStore, FixtureReport};
use crate::settings::{SettingOption, SettingsProvider};

/// A callback run once, right after its module's defaults are merged.
pub type FinalizeHook =
    Box<dyn FnOnce(&mut Application) -> Result<(), ModhostError> + Send + Sync>;

pub struct Module {
    name: String,
    import_name: String,
    root_path: PathBuf,
    static_url_path: String,
    url_prefix: Option<String>,
    template_folder: Option<PathBuf>,
    settings_providers: Vec<SettingsProvider>,
    finalize_hooks: Vec<FinalizeHook>,
}

impl Module {
    /// Create a module. Static files are served under `/static/{name}` unless
    /// [`with_static_url_path`](Self::with_static_url_path) says otherwise.
    pub fn new(name: &str, import_name: &str, root_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            import_name: import_name.to_string(),
            root_path: root_path.into(),
            static_url_path: format!("/static/{name}"),
            url_prefix: None,
            template_folder: None,
            settings_providers: Vec::new(),
            finalize_hooks: Vec::new(),
        }
    }

    pub fn with_static_url_path(mut self, path: &str) -> Self {
        self.static_url_path = path.to_string();
        self
    }

    pub fn with_url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = Some(prefix.to_string());
        self
    }

    /// Template folder, relative to the module's root directory.
    pub fn with_template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }

    /// Record a settings provider. Providers run in registration order; the
    /// same provider registered twice runs twice.
    pub fn settings_provider<F>(&mut self, provider: F)
    where
        F: Fn() -> Vec<SettingOption> + Send + Sync + 'static,
    {
        self.settings_providers.push(Box::new(provider));
    }

    /// Record a finalize hook. Hooks run in registration order when the module
    /// is registered, after its defaults are merged into the config.
    pub fn after_setup<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut Application) -> Result<(), ModhostError> + Send + Sync + 'static,
    {
        self.finalize_hooks.push(Box::new(hook));
    }

    /// One batch of options per provider, produced lazily.
    pub fn get_provided_settings(&self) -> impl Iterator<Item = Vec<SettingOption>> + '_ {
        self.settings_providers.iter().map(|provider| provider())
    }

    /// Seed `store` from this module's `fixtures/data.json`.
    pub fn install_fixtures(&self, store: &mut dyn DataStore) -> Result<FixtureReport, ModhostError> {
        fixtures::install(self, store)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn import_name(&self) -> &str {
        &self.import_name
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Directory holding the module's resources. See [`file::module_root_dir`].
    pub fn root_dir(&self) -> PathBuf {
        file::module_root_dir(&self.root_path)
    }

    pub fn static_url_path(&self) -> &str {
        &self.static_url_path
    }

    pub fn url_prefix(&self) -> Option<&str> {
        self.url_prefix.as_deref()
    }

    /// Absolute template directory, if the module ships templates.
    pub fn template_dir(&self) -> Option<PathBuf> {
        self.template_folder
            .as_ref()
            .map(|folder| self.root_dir().join(folder))
    }

    pub fn fixtures_dir(&self) -> PathBuf {
        self.root_dir().join(fixtures::FIXTURES_DIR)
    }

    pub(crate) fn take_finalize_hooks(&mut self) -> Vec<FinalizeHook> {
        std::mem::take(&mut self.finalize_hooks)
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("import_name", &self.import_name)
            .field("root_path", &self.root_path)
            .field("static_url_path", &self.static_url_path)
            .field("url_prefix", &self.url_prefix)
            .field("template_folder", &self.template_folder)
            .field("settings_providers", &self.settings_providers.len())
            .field("finalize_hooks", &self.finalize_hooks.len())
            .finish()
    }
}

/// An explicit manifest of the modules a feature package provides.
pub trait ModulePackage {
    /// Package name, used in diagnostics.
    fn name(&self) -> &str;

    /// The package's modules, in the order they should register.
    fn modules(&self) -> Vec<Module>;
}
