//! File discovery and loading.
//!
//! Two kinds of files feed the [`ConfigStore`](crate::ConfigStore):
//!
//! - **Instance config files**: `{dir}/{app_name}.toml` for each configured
//!   [`SearchPath`], returned in priority-ascending order so the caller can
//!   deep-merge them (later files override earlier ones).
//! - **Module defaults**: `defaults.toml` in a module's root directory. These
//!   are fall-back values, merged with fill-only-if-absent semantics.
//!
//! Missing files are silently skipped in both cases. Only actual I/O errors
//! (permissions, etc.) are propagated.

use std::path::{Component, Path, PathBuf};

use crate::error::ModhostError;
use crate::types::SearchPath;

/// File name of a module's default configuration.
pub const DEFAULTS_FILE_NAME: &str = "defaults.toml";

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Load every instance config file found across `search_paths`, in priority order.
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
) -> Result<Vec<(PathBuf, String)>, ModhostError> {
    let mut results = Vec::new();
    for dir in search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
    {
        let file_path = dir.join(file_name);
        if let Some(content) = read_optional(&file_path)? {
            results.push((file_path, content));
        }
    }
    Ok(results)
}

/// Read a file, mapping "not found" to `Ok(None)`.
pub fn read_optional(path: &Path) -> Result<Option<String>, ModhostError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ModhostError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Directory that holds a module's resources.
///
/// A module rooted at a file (declared inside a larger package) shares its
/// parent directory. Any other root, including one that does not exist, is its
/// own directory.
pub fn module_root_dir(root_path: &Path) -> PathBuf {
    if !root_path.is_file() {
        return root_path.to_path_buf();
    }
    root_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root_path.to_path_buf())
}

/// Join a `/`-separated relative `name` onto `base`.
///
/// Returns `None` for names that would leave `base`: absolute paths and `..`.
pub fn join_within(base: &Path, name: &str) -> Option<PathBuf> {
    let mut path = base.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

/// Load the defaults file of a module, if it has one.
pub fn load_defaults(root_path: &Path) -> Result<Option<(PathBuf, String)>, ModhostError> {
    let path = module_root_dir(root_path).join(DEFAULTS_FILE_NAME);
    Ok(read_optional(&path)?.map(|content| (path, content)))
}

/// Resolve the instance file `config set` writes to.
pub fn resolve_persist_path(
    persist: &SearchPath,
    file_name: &str,
    app_name: &str,
) -> Result<PathBuf, ModhostError> {
    resolve_search_path(persist, app_name)
        .map(|dir| dir.join(file_name))
        .ok_or(ModhostError::NoPersistPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/srv/blog");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), "ignored");
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn load_no_files_exist() {
        let dir = TempDir::new().unwrap();
        let paths = vec![SearchPath::Path(dir.path().to_path_buf())];
        let files = load_config_files(&paths, "nonexistent.toml", "blog").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn load_multiple_files_in_order() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("blog.toml"), "SERVER_NAME = \"a\"\n").unwrap();
        fs::write(dir2.path().join("blog.toml"), "PORT = 1000\n").unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files = load_config_files(&paths, "blog.toml", "blog").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].1.contains("SERVER_NAME"));
        assert!(files[1].1.contains("PORT"));
    }

    #[test]
    fn missing_file_silently_skipped() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir2.path().join("blog.toml"), "PORT = 1\n").unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files = load_config_files(&paths, "blog.toml", "blog").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn directory_module_owns_its_root() {
        let dir = TempDir::new().unwrap();
        assert_eq!(module_root_dir(dir.path()), dir.path());
    }

    #[test]
    fn file_module_uses_parent_package() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pages.rs");
        fs::write(&file, "").unwrap();
        assert_eq!(module_root_dir(&file), dir.path());
    }

    #[test]
    fn missing_module_dir_keeps_its_own_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DEFAULTS_FILE_NAME), "PARENT_ONLY = 1\n").unwrap();
        let missing = dir.path().join("pages");

        assert_eq!(module_root_dir(&missing), missing);
        assert!(load_defaults(&missing).unwrap().is_none());
    }

    #[test]
    fn join_within_stays_under_base() {
        let base = Path::new("/srv/fixtures/_files");
        assert_eq!(join_within(base, "a/b.txt"), Some(base.join("a").join("b.txt")));
        assert_eq!(join_within(base, "./c.txt"), Some(base.join("c.txt")));
        assert_eq!(join_within(base, "../secret"), None);
        assert_eq!(join_within(base, "/etc/passwd"), None);
    }

    #[test]
    fn defaults_found_next_to_file_module() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pages.rs");
        fs::write(&file, "").unwrap();
        fs::write(dir.path().join(DEFAULTS_FILE_NAME), "PAGE_SIZE = 5\n").unwrap();

        let (path, content) = load_defaults(&file).unwrap().unwrap();
        assert_eq!(path, dir.path().join(DEFAULTS_FILE_NAME));
        assert!(content.contains("PAGE_SIZE"));
    }

    #[test]
    fn missing_defaults_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_defaults(dir.path()).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_returns_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("blog.toml");
        fs::write(&file_path, "PORT = 1\n").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        // Running as root ignores permission bits; only assert when the read actually fails.
        let readable = fs::read_to_string(&file_path).is_ok();
        let result = read_optional(&file_path);
        if !readable {
            assert!(matches!(result, Err(ModhostError::IoError { .. })));
        }

        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn persist_path_explicit() {
        let p = PathBuf::from("/srv/blog");
        let result = resolve_persist_path(&SearchPath::Path(p.clone()), "blog.toml", "blog");
        assert_eq!(result.unwrap(), p.join("blog.toml"));
    }
}
