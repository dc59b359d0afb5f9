use crate::domain::model::{ModelChunk, ModelRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::{Path, PathBuf};

pub type ChunkStream = BoxStream<'static, Result<ModelChunk>>;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn generate(&self, request: &ModelRequest) -> Result<ModelChunk>;
    async fn generate_stream(&self, request: &ModelRequest) -> Result<ChunkStream>;
}

pub trait ArtifactStore: Send + Sync {
    /// Writes `data` under `file_name` and returns the full path. Never
    /// replaces an existing file.
    fn persist(
        &self,
        file_name: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf>> + Send;

    fn location(&self) -> &Path;
}
