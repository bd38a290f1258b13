use color_eyre::{Result, eyre::Context};
use php_fastcgi_gen::{
    cli::{CommandRegistry, EXIT_CODE_FAILED_STARTUP, command_registry},
    tracing_setup,
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let registry = command_registry();
    let matches = registry.to_clap().get_matches();
    let global = CommandRegistry::global_args(&matches)?;

    tracing_setup::init_tracing(&global.log_level, global.log_format)
        .wrap_err("Failed to initialize tracing")?;

    if let Err(e) = registry.dispatch(&matches, &global)?.await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e:?}");
        std::process::exit(EXIT_CODE_FAILED_STARTUP);
    }

    Ok(())
}
