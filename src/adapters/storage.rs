use crate::domain::ports::ArtifactStore;
use crate::utils::error::Result;
use crate::utils::media::extension_for_mime;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Writes artifacts into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn persist(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let full_path = self.base_path.join(file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await?;
        let written = match file.write_all(data).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            drop(file);
            // no partial artifacts
            if let Err(cleanup) = tokio::fs::remove_file(&full_path).await {
                tracing::warn!("Could not remove {}: {}", full_path.display(), cleanup);
            }
            return Err(e.into());
        }

        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(full_path)
    }

    fn location(&self) -> &Path {
        &self.base_path
    }
}

/// Names the artifacts of one compositing call:
/// `<prefix>_<unix_timestamp>_<run_id>_<index>.<ext>`.
///
/// The timestamp only has second granularity, so the random run id is what
/// keeps concurrent calls from colliding.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    prefix: String,
    timestamp: i64,
    run_id: String,
}

impl ArtifactNamer {
    pub fn new(prefix: &str) -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
        Self::with_parts(prefix, chrono::Utc::now().timestamp(), run_id)
    }

    pub fn with_parts(prefix: &str, timestamp: i64, run_id: impl Into<String>) -> Self {
        Self {
            prefix: sanitize_prefix(prefix),
            timestamp,
            run_id: run_id.into(),
        }
    }

    pub fn file_name(&self, index: usize, mime_type: &str) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            self.prefix,
            self.timestamp,
            self.run_id,
            index,
            extension_for_mime(mime_type)
        )
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "generated".to_string()
    } else {
        cleaned
    }
}
