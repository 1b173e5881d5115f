mod config;
mod error;
mod handlers;
mod llm;
mod prompts;
mod routes;
mod state;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let dotenv_path = dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blackbox_backend=debug,tower_http=debug")),
        )
        .init();

    if let Some(path) = dotenv_path {
        info!("Loaded environment from: {}", path.display());
    }

    let config = Config::from_env()?;
    info!("Using model {}", config.model.model);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(config)?;
    let app = routes::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
