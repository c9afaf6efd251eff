use clap::Parser;

use apim_migrate::cli::Cli;
use apim_migrate::run::{self, RunMode};
use apim_migrate::{Config, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let _guard = logging::init(config.log.debug)?;

    let mode = RunMode {
        export: cli.export_apps,
        import: cli.import_apps,
    };
    if mode.is_noop() {
        tracing::warn!("no flags specified. use --help to list example commands");
        return Ok(());
    }

    tracing::info!("-- starting apim-migrate --");

    match run::run(&config, mode).await {
        Ok(summary) => {
            tracing::info!("run complete: {summary}");
            Ok(())
        }
        Err(e) => {
            tracing::error!("run aborted: {e}");
            Err(e.into())
        }
    }
}
