mod batch;
mod config;
mod errors;
mod layout;
mod models;
mod presets;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::layout::{default_page_config, LayoutEngine};
use crate::render::PdfWriter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting toppage v{}", env!("CARGO_PKG_VERSION"));

    let page_config = default_page_config();
    info!(
        "Page {}x{}pt, usable height {}pt",
        page_config.page_width,
        page_config.page_height,
        page_config.usable_height()
    );
    info!(
        "Limits: {} copies, {} students per batch, exam numbers {:?}",
        config.max_copies, config.max_batch_students, config.exam_number_policy
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: LayoutEngine::new(Arc::new(page_config)),
        writer: Arc::new(PdfWriter),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
