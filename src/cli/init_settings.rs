use std::path::PathBuf;

use clap::{ArgMatches, Args, FromArgMatches};
use eyre::{Context, Result, bail};

use crate::{
    cli::{Command, CommandFuture, GlobalArgs},
    config::loader::DEFAULT_SETTINGS_TOML,
};

/// Flags of the `init-settings` command.
#[derive(Args, Debug, Clone)]
pub struct InitSettingsArgs {
    /// Where to write the settings file
    #[arg(long, default_value = "php-fastcgi-gen.toml")]
    pub path: PathBuf,
}

pub fn command() -> Command {
    Command {
        name: "init-settings",
        usage: "php-fastcgi-gen init-settings [--path <file>]",
        short: "Write a commented settings file with the default policy",
        long: "Writes the built-in defaults (ports, script extensions, index file, server name) \
               to a TOML file that can be edited and passed back with --settings. An existing \
               file is never overwritten.",
        args: InitSettingsArgs::augment_args,
        run,
    }
}

fn run(matches: &ArgMatches, _global: &GlobalArgs) -> CommandFuture {
    let args = InitSettingsArgs::from_arg_matches(matches);
    Box::pin(async move { execute(args?).await })
}

pub async fn execute(args: InitSettingsArgs) -> Result<()> {
    if tokio::fs::try_exists(&args.path).await.unwrap_or(false) {
        bail!("Refusing to overwrite existing file {}", args.path.display());
    }

    tokio::fs::write(&args.path, DEFAULT_SETTINGS_TOML)
        .await
        .wrap_err_with(|| format!("Failed to write {}", args.path.display()))?;

    tracing::info!(path = %args.path.display(), "Wrote settings file");
    Ok(())
}
