use anyhow::Result;
use clap::Parser;
use tracing::info;
use twitch_recorder::{
    app,
    cli::{handle_check_command, handle_drain_command, handle_prune_command, Cli, CliCommand},
    config::Config,
    logs,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(CliCommand::Version) = cli.command {
        println!("twitch-recorder {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config_path = Config::path_or_default(cli.config.as_deref())?;
    let config = Config::load(&config_path)?;
    logs::init_logging(
        &logs::level_directive(cli.verbose, cli.log_level),
        config.logging.file.as_deref(),
    )?;
    info!("Loaded config from {}", config_path.display());

    let settings = config.resolve(&cli.overrides())?;

    match cli.command {
        Some(CliCommand::Check) => handle_check_command(&settings).await,
        Some(CliCommand::Drain) => handle_drain_command(&settings).await,
        Some(CliCommand::Prune) => handle_prune_command(&settings).await,
        Some(CliCommand::Version) => Ok(()),
        None => app::run_service(settings).await,
    }
}
