// Adapters layer: concrete implementations for external systems (model API,
// image downloads, local storage).

pub mod fetch;
pub mod gemini;
pub mod sse;
pub mod storage;

pub use fetch::ImageFetcher;
pub use gemini::{GeminiClient, GeminiSettings};
pub use storage::{ArtifactNamer, LocalArtifactStore};
