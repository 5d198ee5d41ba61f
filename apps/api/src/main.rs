mod card_client;
mod config;
mod deck;
mod errors;
mod layout;
mod models;
mod render;
mod routes;
mod sheet;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting proxy sheet API v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.clone()).await?;
    info!(
        "Card client ready (images: {}, text: {}, cache: {} per kind)",
        config.card_image_url_template, config.card_text_api_base, config.card_cache_capacity
    );
    if state.changelog.is_empty() {
        info!("No card id changelog loaded; ids are used as given");
    }
    info!(
        "Overlay font: {} (loaded on first overlay request)",
        state.fonts.path().display()
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
