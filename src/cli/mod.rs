//! Command line surface.
//!
//! Commands live in a [`CommandRegistry`] that `main` builds explicitly with
//! [`command_registry`]. The registry produces the clap parser and dispatches the parsed
//! subcommand to its handler, so the name → handler mapping can be inspected and tested
//! without running the binary.
use std::{collections::BTreeMap, path::PathBuf};

use clap::{ArgMatches, Args, FromArgMatches};
use eyre::{Result, eyre};
use futures_util::future::BoxFuture;

use crate::tracing_setup::LogFormat;

pub mod init_settings;
pub mod php_fastcgi;

/// Exit status when the configuration could not be produced or handed off.
pub const EXIT_CODE_FAILED_STARTUP: i32 = 1;

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Settings file (TOML, YAML or JSON) overriding the built-in policy and ports
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Log filter, e.g. `info` or `php_fastcgi_gen=debug`; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

pub type CommandFuture = BoxFuture<'static, Result<()>>;

/// A registered subcommand.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub short: &'static str,
    pub long: &'static str,
    /// Adds the command's flags to its clap definition
    pub args: fn(clap::Command) -> clap::Command,
    /// Runs the command with its parsed matches
    pub run: fn(&ArgMatches, &GlobalArgs) -> CommandFuture,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Name-ordered set of commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, returning the one it replaced, if any.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        self.commands.insert(command.name, command)
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    /// Build the clap parser for the binary.
    pub fn to_clap(&self) -> clap::Command {
        let root = clap::Command::new(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .about(env!("CARGO_PKG_DESCRIPTION"))
            .subcommand_required(true)
            .arg_required_else_help(true);

        let root = GlobalArgs::augment_args(root);

        self.commands.values().fold(root, |root, command| {
            let sub = clap::Command::new(command.name)
                .about(command.short)
                .long_about(command.long)
                .override_usage(command.usage);
            root.subcommand((command.args)(sub))
        })
    }

    /// Parse global flags from the root matches.
    pub fn global_args(matches: &ArgMatches) -> Result<GlobalArgs> {
        Ok(GlobalArgs::from_arg_matches(matches)?)
    }

    /// Look up the selected subcommand and start it.
    pub fn dispatch(&self, matches: &ArgMatches, global: &GlobalArgs) -> Result<CommandFuture> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| eyre!("No command given"))?;
        let command = self
            .get(name)
            .ok_or_else(|| eyre!("Unknown command '{name}'"))?;

        tracing::debug!(command = name, "Dispatching command");
        Ok((command.run)(sub_matches, global))
    }
}

/// All commands of the binary.
pub fn command_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(php_fastcgi::command());
    registry.register(init_settings::command());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_commands() {
        let registry = command_registry();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["init-settings", "php-fastcgi"]);
        assert_eq!(
            registry.get("php-fastcgi").map(|c| c.short),
            Some("A quick and production-ready PHP FastCGI server")
        );
    }

    #[test]
    fn clap_definition_is_consistent() {
        command_registry().to_clap().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let matches = command_registry()
            .to_clap()
            .try_get_matches_from([
                "php-fastcgi-gen",
                "php-fastcgi",
                "--to",
                ":9000",
                "--root",
                "/srv",
                "--log-format",
                "json",
                "--settings",
                "php.toml",
            ])
            .unwrap();

        let global = CommandRegistry::global_args(&matches).unwrap();
        assert_eq!(global.log_format, LogFormat::Json);
        assert_eq!(global.settings, Some(PathBuf::from("php.toml")));
        assert_eq!(global.log_level, "info");
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register(init_settings::command()).is_none());
        assert!(registry.register(init_settings::command()).is_some());
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn requires_a_subcommand() {
        assert!(
            command_registry()
                .to_clap()
                .try_get_matches_from(["php-fastcgi-gen"])
                .is_err()
        );
    }
}
