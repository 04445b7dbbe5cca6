//! Clap adapter.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Embed
//! [`AppArgs`] in your own `#[derive(Parser)]` struct to get
//! `config list|get|set|unset`, `modules` and `settings` subcommands, then
//! convert with [`AppArgs::into_action`] and hand the result to
//! [`Application::handle`](crate::Application::handle).
//!
//! ```ignore
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     manage: AppArgs,
//! }
//!
//! let action = Cli::parse().manage.into_action();
//! app.handle_and_print(&action)?;
//! ```

use clap::{Args, Subcommand};

use crate::types::AppAction;

#[derive(Debug, Args)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: Option<AppSubcommand>,
}

#[derive(Debug, Subcommand)]
pub enum AppSubcommand {
    /// Inspect or change configuration.
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },
    /// List registered modules.
    Modules,
    /// List the editable settings modules provide.
    Settings,
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every configuration key and its value.
    List,
    /// Show the value of one key.
    Get {
        /// Constant key, e.g. "UPLOADS_PATH".
        key: String,
    },
    /// Persist a value to the instance config file.
    Set {
        /// Constant key, e.g. "UPLOADS_PATH".
        key: String,
        /// Value to set.
        value: String,
    },
    /// Remove a value from the instance config file.
    Unset {
        /// Constant key, e.g. "UPLOADS_PATH".
        key: String,
    },
}

impl AppArgs {
    /// Convert parsed args into an [`AppAction`].
    ///
    /// No subcommand, bare `config` and `config list` all list the config.
    pub fn into_action(self) -> AppAction {
        match self.command {
            None
            | Some(AppSubcommand::Config {
                action: None | Some(ConfigSubcommand::List),
            }) => AppAction::ConfigList,
            Some(AppSubcommand::Config {
                action: Some(ConfigSubcommand::Get { key }),
            }) => AppAction::ConfigGet { key },
            Some(AppSubcommand::Config {
                action: Some(ConfigSubcommand::Set { key, value }),
            }) => AppAction::ConfigSet { key, value },
            Some(AppSubcommand::Config {
                action: Some(ConfigSubcommand::Unset { key }),
            }) => AppAction::ConfigUnset { key },
            Some(AppSubcommand::Modules) => AppAction::Modules,
            Some(AppSubcommand::Settings) => AppAction::Settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        manage: AppArgs,
    }

    fn action(args: &[&str]) -> AppAction {
        TestCli::try_parse_from(args).unwrap().manage.into_action()
    }

    #[test]
    fn no_subcommand_lists_config() {
        assert_eq!(action(&["blog"]), AppAction::ConfigList);
        assert_eq!(action(&["blog", "config"]), AppAction::ConfigList);
        assert_eq!(action(&["blog", "config", "list"]), AppAction::ConfigList);
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            action(&["blog", "config", "get", "UPLOADS_PATH"]),
            AppAction::ConfigGet {
                key: "UPLOADS_PATH".into()
            }
        );
    }

    #[test]
    fn parse_set() {
        assert_eq!(
            action(&["blog", "config", "set", "PAGE_SIZE", "5"]),
            AppAction::ConfigSet {
                key: "PAGE_SIZE".into(),
                value: "5".into()
            }
        );
    }

    #[test]
    fn parse_unset() {
        assert_eq!(
            action(&["blog", "config", "unset", "PAGE_SIZE"]),
            AppAction::ConfigUnset {
                key: "PAGE_SIZE".into()
            }
        );
    }

    #[test]
    fn parse_modules_and_settings() {
        assert_eq!(action(&["blog", "modules"]), AppAction::Modules);
        assert_eq!(action(&["blog", "settings"]), AppAction::Settings);
    }

    #[test]
    fn set_requires_value() {
        assert!(TestCli::try_parse_from(["blog", "config", "set", "PAGE_SIZE"]).is_err());
    }
}
