#[cfg(test)]
pub mod test {
    use std::fs;
    use std::path::Path;

    use confique::Config;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    use crate::file::DEFAULTS_FILE_NAME;
    use crate::fixtures::{FILES_DIR, FIXTURES_DIR, FIXTURES_FILE};

    /// Typed view of the `UPLOADS_*` keys.
    #[derive(Config, Serialize, Deserialize, Debug, PartialEq)]
    pub struct UploadsConfig {
        /// Directory uploads are written to.
        pub path: String,

        /// Largest accepted upload, in megabytes.
        #[config(default = 16)]
        pub max_size: u64,
    }

    #[test]
    fn uploads_config_requires_path() {
        assert!(UploadsConfig::builder().load().is_err());
    }

    // -- On-disk module layouts -------------------------------------------------

    /// A module directory under construction.
    pub struct ModuleDir {
        pub dir: TempDir,
    }

    impl ModuleDir {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        pub fn defaults(self, content: &str) -> Self {
            fs::write(self.path().join(DEFAULTS_FILE_NAME), content).unwrap();
            self
        }

        pub fn template(self, relative: &str, content: &str) -> Self {
            let path = self.path().join("templates").join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        pub fn fixtures(self, content: &str) -> Self {
            let dir = self.path().join(FIXTURES_DIR);
            fs::create_dir_all(dir.join(FILES_DIR)).unwrap();
            fs::write(dir.join(FIXTURES_FILE), content).unwrap();
            self
        }
    }
}
