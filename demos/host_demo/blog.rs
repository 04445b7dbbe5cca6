//! The demo's feature modules and its one plugin.

use std::path::{Path, PathBuf};

use modhost::{
    Application, Module, ModhostError, ModulePackage, OptionKind, Plugin, SettingOption,
};

fn module_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos/host_demo/modules")
        .join(name)
}

/// The modules shipped with the demo blog.
pub struct BlogPackage;

impl ModulePackage for BlogPackage {
    fn name(&self) -> &str {
        "blog"
    }

    fn modules(&self) -> Vec<Module> {
        let mut pages =
            Module::new("pages", "blog.pages", module_dir("pages")).with_template_folder("templates");
        pages.settings_provider(|| {
            vec![
                SettingOption::new("site_title", "Site title", OptionKind::Text, "Demo blog"),
                SettingOption::new("page_size", "Pages per listing", OptionKind::Integer, 10)
                    .description("How many pages the index shows at once."),
            ]
        });
        pages.after_setup(|app| {
            let size = app.config().require("PAGE_SIZE")?;
            tracing::info!(%size, "pages ready");
            Ok(())
        });

        vec![pages]
    }
}

/// Contact forms. Stores uploads under `FORM_UPLOADS_PATH`, which defaults to
/// `{UPLOADS_PATH}/forms`.
#[derive(Default)]
pub struct FormsPlugin {
    uploads: Option<PathBuf>,
}

impl FormsPlugin {
    pub fn uploads(&self) -> Option<&Path> {
        self.uploads.as_deref()
    }
}

impl Plugin for FormsPlugin {
    type Args = ();

    fn name(&self) -> &str {
        "forms"
    }

    fn init_app(&mut self, app: &mut Application, _args: ()) -> Result<(), ModhostError> {
        let uploads = match app.config().get_str("FORM_UPLOADS_PATH") {
            Some(path) => PathBuf::from(path),
            None => app
                .config()
                .get_str("UPLOADS_PATH")
                .map(|path| Path::new(path).join("forms"))
                .ok_or_else(|| {
                    ModhostError::configuration(
                        "Neither the `FORM_UPLOADS_PATH` is defined, nor the `UPLOADS_PATH`. \
                         Set one of them in blog.toml or with BLOG__UPLOADS_PATH.",
                    )
                })?,
        };
        app.config_mut()
            .set("FORM_UPLOADS_PATH", uploads.display().to_string());
        self.uploads = Some(uploads);
        Ok(())
    }

    fn as_module(&mut self) -> Option<Module> {
        let mut module = Module::new("forms", "blog.contrib.forms", module_dir("forms"))
            .with_template_folder("templates")
            .with_url_prefix("/forms");
        module.settings_provider(|| {
            vec![SettingOption::new(
                "captcha",
                "Require a captcha",
                OptionKind::Boolean,
                true,
            )]
        });
        Some(module)
    }
}
