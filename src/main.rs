#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use anyhow::Result;
use clap::Parser;
use planwright::Config;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::Cli;

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => Config::load_or_default(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.logging.level()?)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    cli::dispatch::dispatch(cli, config).await
}
