use crate::utils::error::{OverlayError, Result};
use crate::utils::validation::validate_url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where an input image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(Url),
    Path(PathBuf),
}

impl ImageSource {
    /// `http://` and `https://` strings become URLs, everything else a local path.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(OverlayError::ValidationError {
                message: "image source cannot be empty".to_string(),
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Url(validate_url("image", trimmed)?))
        } else {
            Ok(Self::Path(PathBuf::from(trimmed)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An input image held in memory, ready to be inlined into a model request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl fmt::Debug for ImagePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePart")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseModality {
    Image,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// One request, one complete response.
    #[default]
    Blocking,
    /// Response parts are consumed as the model emits them.
    Streaming,
}

/// One compositing call: input images in order, the instruction text and how
/// to collect the result.
#[derive(Debug, Clone)]
pub struct CompositeJob {
    pub sources: Vec<ImageSource>,
    pub prompt: String,
    pub modalities: Vec<ResponseModality>,
    pub delivery: Delivery,
    pub artifact_prefix: String,
    pub max_artifacts: Option<usize>,
}

impl CompositeJob {
    pub fn new(sources: Vec<ImageSource>, prompt: impl Into<String>) -> Self {
        Self {
            sources,
            prompt: prompt.into(),
            modalities: vec![ResponseModality::Image],
            delivery: Delivery::Blocking,
            artifact_prefix: "generated".to_string(),
            max_artifacts: None,
        }
    }

    pub fn with_modalities(mut self, modalities: Vec<ResponseModality>) -> Self {
        self.modalities = modalities;
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    pub fn with_max_artifacts(mut self, max: usize) -> Self {
        self.max_artifacts = Some(max);
        self
    }
}

/// A part of the request sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Image(ImagePart),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub parts: Vec<RequestPart>,
    pub response_modalities: Vec<ResponseModality>,
}

/// A part of a model response, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Image(ImagePart),
    Text(String),
}

/// One unit of model output: the whole response for blocking calls, one
/// server-sent event for streamed calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelChunk {
    pub parts: Vec<ResponsePart>,
}

/// A file written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CompositeReport {
    pub artifacts: Vec<GeneratedArtifact>,
    pub texts: Vec<String>,
}

impl CompositeReport {
    pub fn first_artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifacts.first()
    }
}
