//! Car price prediction - Main Entry Point

use clap::Parser;
use carprice::cli::{cmd_info, cmd_predict, cmd_preprocess, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carprice=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { data, output, artifacts, reference_year } => {
            cmd_preprocess(&data, &output, artifacts.as_deref(), reference_year)?;
        }
        Commands::Predict { artifacts, record, reference_year } => {
            cmd_predict(&artifacts, &record, reference_year)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
        Commands::Serve { artifacts, host, port, reference_year } => {
            cmd_serve(artifacts, host, port, reference_year).await?;
        }
    }

    Ok(())
}
