mod assist;
mod config;
mod errors;
mod export;
mod layout;
mod llm_client;
mod models;
mod routes;
mod state;
mod validation;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assist::AiAssist;
use crate::config::Config;
use crate::layout::default_page_config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Memoire API v{}", env!("CARGO_PKG_VERSION"));

    // AI assist: Gemini when a key is configured, manual entry only otherwise
    let assist = AiAssist::from_config(&config)?;
    if assist.is_configured() {
        info!("AI assist enabled (model: {})", llm_client::MODEL);
    }

    // PDF page geometry: A4 portrait, Helvetica 11pt
    let page_config = default_page_config();
    info!(
        "PDF page config: {}x{}mm, {}pt",
        page_config.width_mm, page_config.height_mm, page_config.body_font_size_pt
    );

    if let Some(dir) = &config.export_dir {
        info!("Exports archived to {}", dir.display());
    }

    let port = config.port;
    let state = AppState::new(config, assist, page_config);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
