//! Template lookup chain.
//!
//! Rendering belongs to the host framework; this module only decides *which*
//! source a template name resolves to. The application assembles a
//! [`ChoiceLoader`] in this order:
//!
//! 1. the application's own template folder (project-level overrides),
//! 2. the framework's built-in loader, if one was supplied,
//! 3. every registered module's template folder, in registration order.
//!
//! The first loader that has the name wins.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::trace;

use crate::error::ModhostError;
use crate::file;

/// A resolved template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    /// File the template was read from; `None` for in-memory sources.
    pub path: Option<PathBuf>,
    pub source: String,
}

/// A source of templates.
pub trait TemplateLoader: Send + Sync {
    /// Load `name`, or `Ok(None)` if this loader does not have it.
    fn load(&self, name: &str) -> Result<Option<Template>, ModhostError>;
}

/// Templates read from a directory. Names are `/`-separated and relative to it.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a template name to a path under the root. Names that would escape
    /// the root (`..`, absolute paths) map to nothing.
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        file::join_within(&self.root, name)
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> Result<Option<Template>, ModhostError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        if path.is_dir() {
            return Ok(None);
        }
        Ok(file::read_optional(&path)?.map(|source| Template {
            name: name.to_string(),
            path: Some(path),
            source,
        }))
    }
}

/// Templates held in memory, e.g. the built-ins compiled into a framework.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, source: &str) -> Self {
        self.templates.insert(name.to_string(), source.to_string());
        self
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, name: &str) -> Result<Option<Template>, ModhostError> {
        Ok(self.templates.get(name).map(|source| Template {
            name: name.to_string(),
            path: None,
            source: source.clone(),
        }))
    }
}

/// Queries its loaders in order; the first match wins.
#[derive(Default)]
pub struct ChoiceLoader<'a> {
    loaders: Vec<Box<dyn TemplateLoader + 'a>>,
}

impl<'a> ChoiceLoader<'a> {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    pub fn push(&mut self, loader: impl TemplateLoader + 'a) {
        self.loaders.push(Box::new(loader));
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Resolve `name` or fail with [`ModhostError::TemplateNotFound`].
    pub fn resolve(&self, name: &str) -> Result<Template, ModhostError> {
        self.load(name)?
            .ok_or_else(|| ModhostError::TemplateNotFound(name.to_string()))
    }
}

impl TemplateLoader for ChoiceLoader<'_> {
    fn load(&self, name: &str) -> Result<Option<Template>, ModhostError> {
        for (i, loader) in self.loaders.iter().enumerate() {
            if let Some(template) = loader.load(name)? {
                trace!(name, loader = i, "template resolved");
                return Ok(Some(template));
            }
        }
        Ok(None)
    }
}

impl<T: TemplateLoader + ?Sized> TemplateLoader for &T {
    fn load(&self, name: &str) -> Result<Option<Template>, ModhostError> {
        (**self).load(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dir_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn filesystem_loader_reads_nested_names() {
        let dir = dir_with(&[("pages/show.html", "<p>page</p>")]);
        let loader = FileSystemLoader::new(dir.path());
        let template = loader.load("pages/show.html").unwrap().unwrap();
        assert_eq!(template.source, "<p>page</p>");
        assert_eq!(template.path, Some(dir.path().join("pages").join("show.html")));
    }

    #[test]
    fn filesystem_loader_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let loader = FileSystemLoader::new(dir.path());
        assert!(loader.load("nope.html").unwrap().is_none());
    }

    #[test]
    fn filesystem_loader_refuses_parent_segments() {
        let outer = dir_with(&[("secret.txt", "s"), ("templates/index.html", "i")]);
        let loader = FileSystemLoader::new(outer.path().join("templates"));
        assert!(loader.load("../secret.txt").unwrap().is_none());
        assert!(loader.load("./index.html").unwrap().is_some());
    }

    #[test]
    fn filesystem_loader_directory_is_not_a_template() {
        let dir = dir_with(&[("pages/show.html", "x")]);
        let loader = FileSystemLoader::new(dir.path());
        assert!(loader.load("pages").unwrap().is_none());
    }

    #[test]
    fn choice_loader_first_match_wins() {
        let high = MemoryLoader::new().with("base.html", "high");
        let low = MemoryLoader::new()
            .with("base.html", "low")
            .with("only-low.html", "low");
        let mut chain = ChoiceLoader::new();
        chain.push(high);
        chain.push(low);

        assert_eq!(chain.resolve("base.html").unwrap().source, "high");
        assert_eq!(chain.resolve("only-low.html").unwrap().source, "low");
    }

    #[test]
    fn choice_loader_not_found() {
        let chain = ChoiceLoader::new();
        let err = chain.resolve("missing.html").unwrap_err();
        assert!(matches!(err, ModhostError::TemplateNotFound(name) if name == "missing.html"));
    }

    #[test]
    fn borrowed_loaders_chain() {
        let builtin = MemoryLoader::new().with("admin/base.html", "builtin");
        let mut chain = ChoiceLoader::new();
        chain.push(&builtin);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.resolve("admin/base.html").unwrap().source, "builtin");
    }
}
