use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::Mutex;
use toml::{Table, Value};
use tracing::{debug, info, warn};

use crate::boot::{self, BootConfig};
use crate::env;
use crate::error::ModhostError;
use crate::file;
use crate::fixtures::{DataStore, FixtureReport};
use crate::merge::{deep_merge, fill_absent, is_constant_key};
use crate::module::{Module, ModulePackage};
use crate::ops::{self, AppResult};
use crate::persist;
use crate::plugin::{Plugin, PluginRegistry};
use crate::settings::{self, ProvidedSettings};
use crate::store::{self, ConfigStore};
use crate::templates::{ChoiceLoader, FileSystemLoader, Template, TemplateLoader};
use crate::types::{AppAction, SearchPath};
use crate::validate;

/// Default template folder of an application, relative to its root path.
pub const TEMPLATE_FOLDER: &str = "templates";

/// Builder for an [`Application`] and its [`ConfigStore`].
///
/// Config layers, lowest priority first:
///
/// 1. instance files `{app_name}.toml` found in the search paths, deep-merged
///    in order;
/// 2. environment variables `{PREFIX}__{KEY}`;
/// 3. values given with [`config`](Self::config);
/// 4. framework boot defaults, filled only where a key is still absent.
///
/// Module defaults are added later, one module at a time, as modules register.
pub struct ApplicationBuilder {
    app_name: Option<String>,
    root_path: Option<PathBuf>,
    template_folder: Option<PathBuf>,
    file_name: Option<String>,
    search_paths: Vec<SearchPath>,
    persist_path: Option<SearchPath>,
    env_prefix: Option<String>,
    env_enabled: bool,
    strict: bool,
    values: Vec<(String, Value)>,
    builtin_templates: Option<Box<dyn TemplateLoader>>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            app_name: None,
            root_path: None,
            template_folder: Some(PathBuf::from(TEMPLATE_FOLDER)),
            file_name: None,
            search_paths: Vec::new(),
            persist_path: None,
            env_prefix: None,
            env_enabled: true,
            strict: false,
            values: Vec::new(),
            builtin_templates: None,
        }
    }

    /// Set the application name. This derives:
    /// - `file_name` → `"{app_name}.toml"`
    /// - `env_prefix` → `"{APP_NAME}"` (uppercased)
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Directory the application's own resources live in (default: `.`).
    pub fn root_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    /// Template folder relative to the root path (default: `templates`).
    pub fn template_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.template_folder = Some(folder.into());
        self
    }

    /// The application ships no templates of its own.
    pub fn no_template_folder(mut self) -> Self {
        self.template_folder = None;
        self
    }

    /// Override the instance config file name (default: `"{app_name}.toml"`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Directories searched for the instance config file, in
    /// **priority-ascending** order. None by default.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths.push(path);
        self
    }

    /// Where `config set` and `config unset` write.
    ///
    /// If not set, both return [`ModhostError::NoPersistPath`].
    pub fn persist_path(mut self, path: SearchPath) -> Self {
        self.persist_path = Some(path);
        self
    }

    /// Override the environment variable prefix (default: uppercased `app_name`).
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.env_enabled = false;
        self
    }

    /// Enable or disable strict mode (default: `false`).
    /// In strict mode, non-constant keys in instance files and module defaults
    /// are errors instead of being skipped.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set a config value explicitly. Explicit values beat files and env vars.
    pub fn config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.push((key.to_string(), value.into()));
        self
    }

    /// Templates provided by the host framework, searched after the
    /// application's own folder and before any module's.
    pub fn builtin_templates(mut self, loader: impl TemplateLoader + 'static) -> Self {
        self.builtin_templates = Some(Box::new(loader));
        self
    }

    fn effective_app_name(&self) -> Result<&str, ModhostError> {
        self.app_name
            .as_deref()
            .ok_or(ModhostError::AppNameRequired)
    }

    fn effective_file_name(&self) -> Result<String, ModhostError> {
        if let Some(name) = &self.file_name {
            return Ok(name.clone());
        }
        let app = self.effective_app_name()?;
        Ok(format!("{app}.toml"))
    }

    fn effective_env_prefix(&self) -> Result<Option<String>, ModhostError> {
        if !self.env_enabled {
            return Ok(None);
        }
        if let Some(prefix) = &self.env_prefix {
            return Ok(Some(prefix.clone()));
        }
        let app = self.effective_app_name()?;
        Ok(Some(app.to_uppercase()))
    }

    /// Resolve the config layers and create the application.
    pub fn build(self) -> Result<Application, ModhostError> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        self.build_from(vars)
    }

    fn build_from(self, env_vars: Vec<(String, String)>) -> Result<Application, ModhostError> {
        let app_name = self.effective_app_name()?.to_string();
        let file_name = self.effective_file_name()?;
        let env_prefix = self.effective_env_prefix()?;

        let files = load_instance_files(&self.search_paths, &file_name, &app_name, self.strict)?;
        let env_values = env_prefix
            .map(|prefix| env::env_to_table(&prefix, env_vars))
            .unwrap_or_default();
        let explicit: Table = self.values.into_iter().collect();

        let mut config = ConfigStore::from_table(deep_merge(files, env_values.clone()));
        for (key, value) in &explicit {
            config.set(key.as_str(), value.clone());
        }
        let mut defaults = Table::new();
        fill_absent(&mut defaults, boot::boot_defaults()?);
        config.fill_defaults(defaults.clone());

        info!(app = %app_name, keys = config.len(), "application configured");

        Ok(Application {
            name: app_name,
            root_path: self.root_path.unwrap_or_else(|| PathBuf::from(".")),
            template_folder: self.template_folder,
            file_name,
            search_paths: self.search_paths,
            persist_path: self.persist_path,
            strict: self.strict,
            config,
            layers: Layers {
                env: env_values,
                explicit,
                defaults,
            },
            modules: IndexMap::new(),
            plugins: PluginRegistry::new(),
            builtin_templates: self.builtin_templates,
            settings_cache: Mutex::new(None),
        })
    }
}

/// Read and deep-merge the instance files found in `search_paths`.
///
/// Non-constant keys are dropped, or rejected when `strict`.
fn load_instance_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    strict: bool,
) -> Result<Table, ModhostError> {
    let mut values = Table::new();
    for (path, content) in file::load_config_files(search_paths, file_name, app_name)? {
        let mut table = validate::parse_table(&content, &path)?;
        if strict {
            validate::validate_constant_keys(&table, &content, &path)?;
        } else {
            table = table
                .into_iter()
                .filter(|(key, _)| is_constant_key(key))
                .collect();
        }
        debug!(path = %path.display(), "loaded instance config");
        values = deep_merge(values, table);
    }
    Ok(values)
}

/// The config layers other than instance files, kept so a single key can be
/// resolved again after the files change.
struct Layers {
    env: Table,
    explicit: Table,
    /// Boot defaults, then every registered module's defaults, fill-only.
    defaults: Table,
}

/// The host application: owns the config, the registered modules and the
/// installed plugins.
pub struct Application {
    name: String,
    root_path: PathBuf,
    template_folder: Option<PathBuf>,
    file_name: String,
    search_paths: Vec<SearchPath>,
    persist_path: Option<SearchPath>,
    strict: bool,
    config: ConfigStore,
    layers: Layers,
    modules: IndexMap<String, Module>,
    plugins: PluginRegistry,
    builtin_templates: Option<Box<dyn TemplateLoader>>,
    settings_cache: Mutex<Option<ProvidedSettings>>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    /// Register a module.
    ///
    /// Merges the module's `defaults.toml` into the config (absent keys only),
    /// runs its finalize hooks in order, then records it. A hook error aborts
    /// registration and is returned unchanged; the module is not recorded.
    pub fn register_module(&mut self, mut module: Module) -> Result<(), ModhostError> {
        if self.modules.contains_key(module.name()) {
            return Err(ModhostError::DuplicateModule(module.name().to_string()));
        }

        let defaults = store::module_defaults(module.root_path(), self.strict)?;
        fill_absent(&mut self.layers.defaults, defaults.clone());
        let filled = self.config.fill_defaults(defaults);
        debug!(module = module.name(), ?filled, "module defaults merged");

        for hook in module.take_finalize_hooks() {
            hook(self)?;
        }

        // A hook may itself have registered modules.
        if self.modules.contains_key(module.name()) {
            return Err(ModhostError::DuplicateModule(module.name().to_string()));
        }
        info!(
            module = module.name(),
            import_name = module.import_name(),
            "module registered"
        );
        self.modules.insert(module.name().to_string(), module);
        self.invalidate_settings();
        Ok(())
    }

    /// Register every module of `package` in manifest order, skipping the ones
    /// listed in `EXCLUDED_MODULES` by name or import name.
    ///
    /// Returns the names of the modules registered.
    pub fn register_package(&mut self, package: &dyn ModulePackage) -> Result<Vec<String>, ModhostError> {
        let boot = BootConfig::from_store(&self.config)?;
        let mut registered = Vec::new();
        for module in package.modules() {
            let excluded = boot
                .excluded_modules
                .iter()
                .any(|e| e == module.name() || e == module.import_name());
            if excluded {
                info!(package = package.name(), module = module.name(), "module excluded");
                continue;
            }
            registered.push(module.name().to_string());
            self.register_module(module)?;
        }
        Ok(registered)
    }

    /// Install a plugin.
    ///
    /// The plugin is created by `factory`, initialized with `args`, stored, and
    /// then, if it provides one, its module is registered.
    pub fn use_plugin<P: Plugin>(
        &mut self,
        factory: impl FnOnce() -> P,
        args: P::Args,
    ) -> Result<(), ModhostError> {
        let mut plugin = factory();
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            return Err(ModhostError::DuplicatePlugin(name));
        }

        plugin.init_app(self, args)?;
        let module = plugin.as_module();
        self.plugins.insert(plugin)?;
        info!(plugin = %name, with_module = module.is_some(), "plugin installed");
        self.invalidate_settings();

        if let Some(module) = module {
            self.register_module(module)?;
        }
        Ok(())
    }

    pub fn plugin<P: Plugin>(&self, name: &str) -> Option<&P> {
        self.plugins.get(name)
    }

    pub fn plugin_mut<P: Plugin>(&mut self, name: &str) -> Option<&mut P> {
        self.plugins.get_mut(name)
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.names()
    }

    /// Registered modules, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Settings of every registered module.
    ///
    /// The aggregate is computed once and reused until a module or plugin is
    /// registered or [`invalidate_settings`](Self::invalidate_settings) is called.
    pub fn provided_settings(&self) -> ProvidedSettings {
        let mut cache = self.settings_cache.lock();
        cache
            .get_or_insert_with(|| settings::aggregate(self.modules.values()))
            .clone()
    }

    /// Drop the cached settings so the next read calls every provider again.
    pub fn invalidate_settings(&self) {
        *self.settings_cache.lock() = None;
    }

    /// The application's own template directory, if it has one.
    pub fn template_dir(&self) -> Option<PathBuf> {
        self.template_folder
            .as_ref()
            .map(|folder| self.root_path.join(folder))
    }

    /// The current template chain: application folder, built-ins, then module
    /// folders in registration order.
    pub fn template_loader(&self) -> ChoiceLoader<'_> {
        let mut chain = ChoiceLoader::new();
        if let Some(dir) = self.template_dir() {
            chain.push(FileSystemLoader::new(dir));
        }
        if let Some(builtin) = &self.builtin_templates {
            chain.push(builtin.as_ref());
        }
        for dir in self.modules.values().filter_map(Module::template_dir) {
            chain.push(FileSystemLoader::new(dir));
        }
        chain
    }

    pub fn resolve_template(&self, name: &str) -> Result<Template, ModhostError> {
        self.template_loader().resolve(name)
    }

    /// Install the fixtures of every registered module, in registration order.
    pub fn install_fixtures(&self, store: &mut dyn DataStore) -> Result<Vec<FixtureReport>, ModhostError> {
        self.modules
            .values()
            .map(|module| module.install_fixtures(store))
            .collect()
    }

    fn persist_file(&self) -> Result<PathBuf, ModhostError> {
        let persist = self
            .persist_path
            .as_ref()
            .ok_or(ModhostError::NoPersistPath)?;
        file::resolve_persist_path(persist, &self.file_name, &self.name)
    }

    /// Resolve `key` from the layers as a fresh start would see them: instance
    /// files (read again), env vars, explicit values, then defaults.
    fn reload_key(&mut self, key: &str) -> Result<(), ModhostError> {
        let files = load_instance_files(&self.search_paths, &self.file_name, &self.name, self.strict)?;
        let value = [&self.layers.explicit, &self.layers.env, &files, &self.layers.defaults]
            .into_iter()
            .find_map(|layer| layer.get(key))
            .cloned();
        debug!(key, ?value, "config key reloaded");
        match value {
            Some(value) => self.config.set(key, value),
            None => self.config.remove(key),
        };
        Ok(())
    }

    /// Handle a management action. `config set` and `config unset` write the
    /// instance config file, then resolve the key again from every layer so
    /// the live config matches what the next start would produce.
    pub fn handle(&mut self, action: &AppAction) -> Result<AppResult, ModhostError> {
        match action {
            AppAction::ConfigList => Ok(ops::list_values(&self.config)),
            AppAction::ConfigGet { key } => ops::get_value(&self.config, key),
            AppAction::ConfigSet { key, value } => {
                let path = self.persist_file()?;
                let value = persist::parse_value(value);
                let result = persist::persist_value(&path, key, &value)?;
                self.reload_key(key)?;
                if self.config.get(key) != Some(&value) {
                    warn!(
                        key = key.as_str(),
                        path = %path.display(),
                        "persisted value is overridden by a higher-priority layer"
                    );
                }
                Ok(result)
            }
            AppAction::ConfigUnset { key } => {
                let path = self.persist_file()?;
                let result = persist::unset_value(&path, key)?;
                self.reload_key(key)?;
                Ok(result)
            }
            AppAction::Modules => Ok(ops::list_modules(self.modules.values())),
            AppAction::Settings => Ok(ops::list_settings(&self.provided_settings())),
        }
    }

    /// Handle an action and print the result to stdout.
    pub fn handle_and_print(&mut self, action: &AppAction) -> Result<(), ModhostError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }
}
