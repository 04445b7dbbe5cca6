//! Installable cross-cutting extensions.
//!
//! A [`Plugin`] is handed the [`Application`] once, through
//! [`init_app`](Plugin::init_app), and is then kept in a type-erased
//! [`PluginRegistry`] so other code can fetch it back by concrete type.
//! A plugin that also ships defaults, templates, fixtures or settings returns
//! a [`Module`] from [`as_module`](Plugin::as_module); that module is
//! registered right after `init_app`, so its finalize hooks see whatever
//! `init_app` set up.

use std::any::Any;

use indexmap::IndexMap;

use crate::app::Application;
use crate::error::ModhostError;
use crate::module::Module;

pub trait Plugin: Any + Send + Sync {
    /// Arguments passed through [`Application::use_plugin`].
    type Args;

    /// Unique name; a second plugin with the same name is rejected.
    fn name(&self) -> &str;

    fn init_app(&mut self, app: &mut Application, args: Self::Args) -> Result<(), ModhostError>;

    /// The module to register for this plugin, if it needs one.
    fn as_module(&mut self) -> Option<Module> {
        None
    }
}

/// Installed plugins, by name, in installation order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Box<dyn Any + Send + Sync>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn insert<P: Plugin>(&mut self, plugin: P) -> Result<(), ModhostError> {
        let name = plugin.name().to_string();
        if self.contains(&name) {
            return Err(ModhostError::DuplicatePlugin(name));
        }
        self.plugins.insert(name, Box::new(plugin));
        Ok(())
    }

    /// The plugin installed under `name`, if it is a `P`.
    pub fn get<P: Plugin>(&self, name: &str) -> Option<&P> {
        self.plugins.get(name)?.downcast_ref::<P>()
    }

    pub fn get_mut<P: Plugin>(&mut self, name: &str) -> Option<&mut P> {
        self.plugins.get_mut(name)?.downcast_mut::<P>()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
