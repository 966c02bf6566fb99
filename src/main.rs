mod cli;
mod dashboard;
mod error;
mod history;
mod render;
mod scheduler;
mod status;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting zkdash - zkVM compliance dashboard");
    cli.execute().await?;

    Ok(())
}
