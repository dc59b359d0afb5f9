pub mod compositor;
pub mod prompt;

pub use crate::domain::model::{CompositeJob, CompositeReport, GeneratedArtifact, ImageSource};
pub use crate::domain::ports::{ArtifactStore, GenerativeModel};
pub use crate::utils::error::Result;
