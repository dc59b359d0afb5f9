use std::sync::Arc;

use crate::adapters::{GeminiClient, LocalArtifactStore};
use crate::config::ServiceConfig;
use crate::core::compositor::Compositor;

pub type GlassesCompositor = Compositor<GeminiClient, LocalArtifactStore>;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub compositor: Arc<GlassesCompositor>,
}

impl AppState {
    pub fn new(config: ServiceConfig, compositor: GlassesCompositor) -> Self {
        Self {
            config: Arc::new(config),
            compositor: Arc::new(compositor),
        }
    }
}
