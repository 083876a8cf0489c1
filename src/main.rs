use clap::Parser;
use std::process::ExitCode;
use topic_chat::{config::Args, logger};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logger::try_init().map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // A missing API key stops everything before the listener is bound.
    let settings = match Args::parse().into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    topic_chat::run(settings).await?;
    Ok(ExitCode::SUCCESS)
}
