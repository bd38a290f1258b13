use std::{sync::Arc, time::Duration};

use clap::{ArgMatches, Args, FromArgMatches};
use eyre::{Context, Result};

use crate::{
    adapters::config_sinks::{AdminApiSink, FileConfigSink, OutputTarget},
    cli::{Command, CommandFuture, GlobalArgs},
    config::{loader::load_settings, models::Settings, validation::ConfigValidator},
    core::synthesis::{DEFAULT_FROM, Synthesis, synthesize_all},
    ports::config_sink::ConfigSink,
};

/// Flags of the `php-fastcgi` command.
#[derive(Args, Debug, Clone)]
pub struct PhpFastcgiArgs {
    /// Address on which to receive traffic
    #[arg(long, default_value = DEFAULT_FROM)]
    pub from: String,

    /// Upstream address to which to proxy traffic
    #[arg(long)]
    pub to: Option<String>,

    /// Directory to process PHP files from
    #[arg(long)]
    pub root: Option<String>,

    /// Write the config here; `-` is stdout (the default unless --load is given)
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Admin endpoint of a running runtime to load the config into, e.g. http://localhost:2019
    #[arg(long, value_name = "URL")]
    pub load: Option<String>,

    /// Indent the JSON output
    #[arg(long)]
    pub pretty: bool,
}

const LONG_ABOUT: &str = "\
A simple but production-ready PHP FastCGI server config. Useful for quick deployments,
demos, and development.

Unless otherwise specified in the addresses, the --from address will be
assumed to be HTTPS if a hostname is given.

If the --from address has a host or IP, the runtime will attempt to serve the
proxy over HTTPS with a certificate (unless overridden by the HTTP scheme
or port).

The --root parameter needs to be specified as a directory: the document root
the FastCGI process resolves scripts against.";

pub fn command() -> Command {
    Command {
        name: "php-fastcgi",
        usage: "php-fastcgi-gen php-fastcgi [--from <addr>] --to <addr> --root <dir>",
        short: "A quick and production-ready PHP FastCGI server",
        long: LONG_ABOUT,
        args: PhpFastcgiArgs::augment_args,
        run,
    }
}

fn run(matches: &ArgMatches, global: &GlobalArgs) -> CommandFuture {
    let args = PhpFastcgiArgs::from_arg_matches(matches);
    let global = global.clone();
    Box::pin(async move { execute(args?, global).await })
}

/// Synthesize, validate and hand off the config.
pub async fn execute(args: PhpFastcgiArgs, global: GlobalArgs) -> Result<()> {
    let settings = load_settings(global.settings.as_deref())?;

    let Synthesis {
        downstream,
        upstream,
        config,
    } = synthesize_all(
        Some(&args.from),
        args.to.as_deref().unwrap_or_default(),
        args.root.as_deref().unwrap_or_default(),
        &settings,
    )
    .wrap_err("Failed to generate PHP FastCGI config")?;

    ConfigValidator::validate(&config).wrap_err("Generated config failed validation")?;

    for sink in sinks(&args, &settings)? {
        tracing::info!(destination = %sink.describe(), "Emitting config");
        sink.emit(&config)
            .await
            .wrap_err_with(|| format!("Failed to emit config to {}", sink.describe()))?;
    }

    tracing::info!(%downstream, %upstream, "Config ready");
    eprintln!("proxying PHP FastCGI {downstream} -> {upstream}");
    Ok(())
}

fn sinks(args: &PhpFastcgiArgs, settings: &Settings) -> Result<Vec<Arc<dyn ConfigSink>>> {
    let mut sinks: Vec<Arc<dyn ConfigSink>> = Vec::new();

    if args.output.is_some() || args.load.is_none() {
        let target = OutputTarget::from_arg(args.output.as_deref().unwrap_or("-"));
        sinks.push(Arc::new(FileConfigSink::new(target, args.pretty)));
    }

    if let Some(endpoint) = &args.load {
        let timeout = Duration::from_secs(settings.admin_api.timeout_secs);
        let sink = AdminApiSink::new(endpoint, timeout).context("Invalid --load endpoint")?;
        sinks.push(Arc::new(sink));
    }

    Ok(sinks)
}
