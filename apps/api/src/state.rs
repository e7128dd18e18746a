use std::sync::Arc;

use crate::config::Config;
use crate::layout::LayoutEngine;
use crate::render::DocumentWriter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: LayoutEngine,
    /// Output format for preview and batch downloads. PDF today.
    pub writer: Arc<dyn DocumentWriter>,
}
