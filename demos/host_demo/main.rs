//! # modhost demo application
//!
//! A small blog host that registers a package of modules and a plugin, then
//! answers management commands. It exists to exercise modhost by hand.
//!
//! ## Running
//!
//! ```sh
//! BLOG__UPLOADS_PATH=/tmp/uploads cargo run --example host_demo -- modules
//! ```
//!
//! | Feature                | How to exercise it                                                |
//! |------------------------|-------------------------------------------------------------------|
//! | Module defaults        | `... -- config get PAGE_SIZE`                                     |
//! | Env var override       | `BLOG__PAGE_SIZE=3 ... -- config get PAGE_SIZE`                   |
//! | Instance config file   | Create `blog.toml` in cwd, then `config list`                     |
//! | `config set` / `unset` | `... -- config set PAGE_SIZE 25` (writes `./blog.toml`)           |
//! | Excluded modules       | Put `EXCLUDED_MODULES = ["blog.pages"]` in `./blog.toml`          |
//! | Settings               | `... -- settings`                                                 |
//! | Templates              | `... -- template pages/index.html`                                |
//! | Fixtures               | `... -- fixtures`                                                 |
//! | Missing config         | Run without `BLOG__UPLOADS_PATH`                                  |
//! | Logging                | `RUST_LOG=modhost=debug ...`                                      |

mod blog;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modhost::{AppArgs, AppSubcommand, Application, MemoryLoader, MemoryStore, SearchPath};

use blog::{BlogPackage, FormsPlugin};

/// modhost demo: a blog assembled from modules.
#[derive(Parser, Debug)]
#[command(name = "blog")]
struct Cli {
    /// Fail on lowercase keys in config files instead of skipping them.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show which file a template name resolves to.
    Template { name: String },
    /// Install every module's fixtures into an in-memory store.
    Fixtures,
    #[command(flatten)]
    Manage(AppSubcommand),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn build(strict: bool) -> Result<Application, modhost::ModhostError> {
    let mut app = Application::builder()
        .app_name("blog")
        .root_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/host_demo"))
        .search_paths(vec![SearchPath::Platform, SearchPath::Cwd])
        .persist_path(SearchPath::Cwd)
        .strict(strict)
        .builtin_templates(MemoryLoader::new().with("admin/index.html", "<h1>Admin</h1>"))
        .build()?;

    app.register_package(&BlogPackage)?;
    app.use_plugin(FormsPlugin::default, ())?;

    if let Some(forms) = app.plugin::<FormsPlugin>("forms") {
        tracing::debug!(uploads = ?forms.uploads(), "forms plugin ready");
    }
    Ok(app)
}

fn run(cli: Cli) -> Result<(), modhost::ModhostError> {
    let mut app = build(cli.strict)?;

    match cli.command {
        Some(Commands::Template { name }) => {
            let template = app.resolve_template(&name)?;
            match &template.path {
                Some(path) => println!("{name} -> {}", path.display()),
                None => println!("{name} -> <built-in>"),
            }
        }
        Some(Commands::Fixtures) => {
            let mut store = MemoryStore::new().with_model("blog.pages.Page");
            for report in app.install_fixtures(&mut store)? {
                println!("{}: {} rows", report.module, report.total_installed());
            }
            for row in store.rows("blog.pages.Page") {
                let title = row.get("title").and_then(|v| v.as_str()).unwrap_or_default();
                let created = row.get("created_date").and_then(|v| v.as_datetime());
                println!("  {title} ({})", created.map(|d| d.to_rfc3339()).unwrap_or_default());
            }
        }
        Some(Commands::Manage(command)) => {
            let action = AppArgs {
                command: Some(command),
            }
            .into_action();
            app.handle_and_print(&action)?;
        }
        None => app.handle_and_print(&AppArgs { command: None }.into_action())?,
    }
    Ok(())
}
