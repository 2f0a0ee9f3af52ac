use clap::Parser;
use tracing::info;

use x402_scout::api;
use x402_scout::cli::{Cli, Commands};
use x402_scout::config::Config;
use x402_scout::facilitator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Server(args) => api::run(args.address, config).await?,
        Commands::Crawl => {
            let state = api::build_state(config).await?;
            let endpoints = state
                .refresher
                .discover_and_update(true, false)
                .await
                .map_err(|message| -> Box<dyn std::error::Error + Send + Sync> {
                    message.into()
                })?;
            info!(endpoints = endpoints.len(), "Crawl finished");
        }
        Commands::Sync => {
            let state = api::build_state(config).await?;
            let report = facilitator::sync_all(&state.resources).await;
            info!(total = report.total, "Facilitator sync finished");
        }
    }

    Ok(())
}
