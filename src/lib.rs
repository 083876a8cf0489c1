pub mod commands;
pub mod config;
pub mod history;
pub mod llm;
pub mod logger;
pub mod prompt;
pub mod render;
pub mod server;
pub mod session;
pub mod state;

use config::Settings;
use state::AppState;
use std::sync::Arc;

/// Serve the chat page with already-resolved settings until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        topic = settings.policy.topic(),
        model = %settings.model,
        max_messages = settings.max_messages,
        "starting topic chat"
    );
    let bind = settings.bind.clone();
    let state = Arc::new(AppState::new(settings));
    server::serve(state, &bind).await
}
