pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use adapters::{GeminiClient, GeminiSettings, ImageFetcher, LocalArtifactStore};
pub use config::ServiceConfig;
pub use core::compositor::{glasses_overlay_job, Compositor};
pub use domain::model::{CompositeJob, CompositeReport, GeneratedArtifact, ImageSource};
pub use utils::error::{OverlayError, Result};
