use crate::adapters::fetch::ImageFetcher;
use crate::adapters::storage::ArtifactNamer;
use crate::core::prompt::{resolve_prompt, GLASSES_OVERLAY_PROMPT};
use crate::core::{ArtifactStore, GenerativeModel};
use crate::domain::model::{
    CompositeJob, CompositeReport, Delivery, GeneratedArtifact, ImageSource, ModelChunk,
    ModelRequest, RequestPart, ResponsePart,
};
use crate::utils::error::{OverlayError, Result};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Instant;

/// Sends input images plus an instruction to the model and saves every image
/// it returns.
pub struct Compositor<M: GenerativeModel, S: ArtifactStore> {
    model: M,
    store: S,
    fetcher: ImageFetcher,
}

impl<M: GenerativeModel, S: ArtifactStore> Compositor<M, S> {
    pub fn new(model: M, store: S, fetcher: ImageFetcher) -> Self {
        Self {
            model,
            store,
            fetcher,
        }
    }

    pub async fn run(&self, job: &CompositeJob) -> Result<CompositeReport> {
        let started = Instant::now();

        if job.sources.is_empty() {
            return Err(OverlayError::ValidationError {
                message: "at least one input image is required".to_string(),
            });
        }

        // Local inputs are checked before any download or model call.
        self.fetcher.preflight(&job.sources)?;

        let request = self.build_request(job).await?;
        tracing::info!(
            "Processing {} image(s) with {} ({:?})",
            job.sources.len(),
            self.model.model_name(),
            job.delivery
        );

        let namer = ArtifactNamer::new(&job.artifact_prefix);
        let mut report = CompositeReport::default();

        match job.delivery {
            Delivery::Blocking => {
                let chunk = self.model.generate(&request).await?;
                self.save_chunk(chunk, &namer, job.max_artifacts, &mut report)
                    .await?;
            }
            Delivery::Streaming => {
                let mut chunks = self.model.generate_stream(&request).await?;
                while let Some(chunk) = chunks.next().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        // saved images stand; a late block or stream error ends the stream
                        Err(e) if !report.artifacts.is_empty() => {
                            tracing::warn!(
                                "Stream ended after {} artifact(s): {}",
                                report.artifacts.len(),
                                e
                            );
                            break;
                        }
                        Err(e) => return Err(e),
                    };
                    let full = self
                        .save_chunk(chunk, &namer, job.max_artifacts, &mut report)
                        .await?;
                    if full {
                        tracing::debug!("Artifact limit reached, dropping rest of stream");
                        break;
                    }
                }
            }
        }

        if report.artifacts.is_empty() {
            let text = if report.texts.is_empty() {
                None
            } else {
                Some(report.texts.join("\n"))
            };
            return Err(OverlayError::NoImageGenerated { text });
        }

        tracing::info!(
            "Saved {} artifact(s) to {} in {:?}",
            report.artifacts.len(),
            self.store.location().display(),
            started.elapsed()
        );
        Ok(report)
    }

    async fn build_request(&self, job: &CompositeJob) -> Result<ModelRequest> {
        let mut parts = Vec::with_capacity(job.sources.len() + 1);
        for source in &job.sources {
            let image = self.fetcher.fetch(source).await?;
            parts.push(RequestPart::Image(image));
        }
        parts.push(RequestPart::Text(job.prompt.clone()));

        Ok(ModelRequest {
            parts,
            response_modalities: job.modalities.clone(),
        })
    }

    /// Returns true once `max_artifacts` images have been saved.
    async fn save_chunk(
        &self,
        chunk: ModelChunk,
        namer: &ArtifactNamer,
        max_artifacts: Option<usize>,
        report: &mut CompositeReport,
    ) -> Result<bool> {
        for part in chunk.parts {
            match part {
                ResponsePart::Image(image) => {
                    if limit_reached(report, max_artifacts) {
                        continue;
                    }
                    let file_name = namer.file_name(report.artifacts.len(), &image.mime_type);
                    let path = self.store.persist(&file_name, &image.data).await?;
                    tracing::info!("Image saved to: {}", path.display());

                    report.artifacts.push(GeneratedArtifact {
                        file_name,
                        path,
                        mime_type: image.mime_type,
                        size_bytes: image.data.len(),
                    });
                }
                ResponsePart::Text(text) => {
                    tracing::info!("Model text: {}", text);
                    report.texts.push(text);
                }
            }
        }

        Ok(limit_reached(report, max_artifacts))
    }
}

fn limit_reached(report: &CompositeReport, max_artifacts: Option<usize>) -> bool {
    max_artifacts.is_some_and(|max| report.artifacts.len() >= max)
}

/// The glasses flow: photo first, overlay second, one blocking image-only
/// call, first returned image kept.
pub fn glasses_overlay_job(
    photo: ImageSource,
    glasses: impl Into<PathBuf>,
    prompt: Option<&str>,
) -> CompositeJob {
    CompositeJob::new(
        vec![photo, ImageSource::Path(glasses.into())],
        resolve_prompt(prompt, GLASSES_OVERLAY_PROMPT),
    )
    .with_prefix("with_glasses")
    .with_max_artifacts(1)
}
