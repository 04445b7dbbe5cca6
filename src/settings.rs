//! Editable settings contributed by modules.
//!
//! A module registers any number of settings providers; each provider returns a
//! batch of [`SettingOption`]s when called. [`aggregate`] flattens the batches
//! of all modules into one [`ProvidedSettings`] collection keyed by option name.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::Value;
use tracing::warn;

use crate::module::Module;

/// How an option is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Text,
    Boolean,
    Integer,
    Float,
    Choice(Vec<String>),
}

/// A user-editable setting descriptor.
///
/// Only `name` and `module` matter to the registration machinery; the rest is
/// for whatever renders the settings to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingOption {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub kind: OptionKind,
    pub value: Value,
    /// Name of the module that provided this option. Set during aggregation.
    pub module: Option<String>,
}

impl SettingOption {
    pub fn new(name: &str, label: &str, kind: OptionKind, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: None,
            kind,
            value: value.into(),
            module: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A provider returns one batch of options per call.
pub type SettingsProvider = Box<dyn Fn() -> Vec<SettingOption> + Send + Sync>;

/// Aggregated settings of every registered module, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ProvidedSettings {
    options: Arc<IndexMap<String, SettingOption>>,
}

impl ProvidedSettings {
    pub fn get(&self, name: &str) -> Option<&SettingOption> {
        self.options.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingOption> {
        self.options.values()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options grouped by owning module, in module order.
    pub fn by_module(&self) -> IndexMap<&str, Vec<&SettingOption>> {
        let mut groups: IndexMap<&str, Vec<&SettingOption>> = IndexMap::new();
        for option in self.iter() {
            let module = option.module.as_deref().unwrap_or_default();
            groups.entry(module).or_default().push(option);
        }
        groups
    }
}

/// Call every provider of every module and flatten the results.
///
/// Each option is tagged with its module's name. When two options share a
/// name the later one wins but keeps the position of the first.
pub fn aggregate<'a>(modules: impl IntoIterator<Item = &'a Module>) -> ProvidedSettings {
    let mut options: IndexMap<String, SettingOption> = IndexMap::new();
    for module in modules {
        for batch in module.get_provided_settings() {
            for mut option in batch {
                option.module = Some(module.name().to_string());
                if let Some(previous) = options.get(&option.name) {
                    warn!(
                        option = %option.name,
                        previous = previous.module.as_deref().unwrap_or_default(),
                        module = module.name(),
                        "settings option provided twice, keeping the later one"
                    );
                }
                options.insert(option.name.clone(), option);
            }
        }
    }
    ProvidedSettings {
        options: Arc::new(options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str) -> SettingOption {
        SettingOption::new(name, name, OptionKind::Text, "")
    }

    fn names(settings: &ProvidedSettings) -> Vec<&str> {
        settings.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn flattens_batches_in_registration_order() {
        let mut pages = Module::new("pages", "blog.pages", "/tmp/pages");
        pages.settings_provider(|| vec![text("a"), text("b")]);
        pages.settings_provider(|| vec![text("c")]);

        let settings = aggregate([&pages]);
        assert_eq!(names(&settings), vec!["a", "b", "c"]);
        assert!(settings.iter().all(|o| o.module.as_deref() == Some("pages")));
    }

    #[test]
    fn tags_each_module() {
        let mut pages = Module::new("pages", "blog.pages", "/tmp/pages");
        pages.settings_provider(|| vec![text("title")]);
        let mut forms = Module::new("forms", "blog.forms", "/tmp/forms");
        forms.settings_provider(|| vec![text("captcha")]);

        let settings = aggregate([&pages, &forms]);
        assert_eq!(settings.get("title").unwrap().module.as_deref(), Some("pages"));
        assert_eq!(settings.get("captcha").unwrap().module.as_deref(), Some("forms"));

        let groups = settings.by_module();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["pages", "forms"]);
    }

    #[test]
    fn last_option_with_same_name_wins() {
        let mut pages = Module::new("pages", "blog.pages", "/tmp/pages");
        pages.settings_provider(|| {
            vec![SettingOption::new("theme", "Theme", OptionKind::Text, "light"), text("z")]
        });
        let mut themes = Module::new("themes", "blog.themes", "/tmp/themes");
        themes.settings_provider(|| {
            vec![SettingOption::new("theme", "Theme", OptionKind::Text, "dark")]
        });

        let settings = aggregate([&pages, &themes]);
        assert_eq!(settings.len(), 2);
        let theme = settings.get("theme").unwrap();
        assert_eq!(theme.value.as_str(), Some("dark"));
        assert_eq!(theme.module.as_deref(), Some("themes"));
        assert_eq!(names(&settings), vec!["theme", "z"]);
    }

    #[test]
    fn duplicate_provider_runs_twice() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn provider() -> Vec<SettingOption> {
            CALLS.fetch_add(1, Ordering::SeqCst);
            vec![SettingOption::new("x", "X", OptionKind::Boolean, true)]
        }

        let mut pages = Module::new("pages", "blog.pages", "/tmp/pages");
        pages.settings_provider(provider);
        pages.settings_provider(provider);

        let settings = aggregate([&pages]);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(settings.len(), 1);
    }

    #[test]
    fn no_modules_no_settings() {
        let settings = aggregate(std::iter::empty::<&Module>());
        assert!(settings.is_empty());
    }
}
