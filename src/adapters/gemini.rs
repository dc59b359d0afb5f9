//! Client for the Gemini `generateContent` family of endpoints.

use crate::adapters::sse::SseDecoder;
use crate::domain::model::{
    ImagePart, ModelChunk, ModelRequest, RequestPart, ResponseModality, ResponsePart,
};
use crate::domain::ports::{ChunkStream, GenerativeModel};
use crate::utils::error::{OverlayError, Result};
use async_trait::async_trait;
use base64::Engine;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

const MAX_ERROR_BODY: usize = 500;

const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "IMAGE_PROHIBITED_CONTENT",
    "BLOCKLIST",
    "RECITATION",
    "IMAGE_RECITATION",
];

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
            method
        )
    }

    async fn post(&self, url: &str, body: &GenerateContentRequest) -> Result<reqwest::Response> {
        tracing::debug!("POST {} ({} parts)", url, body.contents[0].parts.len());

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);

        if status.is_success() {
            Ok(response)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(parse_error(status.as_u16(), &text))
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelChunk> {
        let body = GenerateContentRequest::from_model_request(request);
        let response = self.post(&self.endpoint("generateContent"), &body).await?;

        let text = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        parsed.into_chunk()
    }

    async fn generate_stream(&self, request: &ModelRequest) -> Result<ChunkStream> {
        let body = GenerateContentRequest::from_model_request(request);
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &body).await?;

        let state = StreamState {
            body: response
                .bytes_stream()
                .map(|piece| piece.map(|bytes| bytes.to_vec()))
                .boxed(),
            decoder: SseDecoder::new(),
            queued: VecDeque::new(),
            finished: false,
        };

        let chunks = futures::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(data) = state.queued.pop_front() {
                    return Some((parse_chunk(&data), state));
                }
                if state.finished {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(bytes)) => {
                        let events = state.decoder.feed(&bytes);
                        state.queued.extend(events);
                    }
                    Some(Err(e)) => {
                        state.finished = true;
                        return Some((Err(OverlayError::from(e)), state));
                    }
                    None => {
                        state.finished = true;
                        let tail = state.decoder.finish();
                        state.queued.extend(tail);
                    }
                }
            }
        });

        Ok(chunks.boxed())
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    queued: VecDeque<String>,
    finished: bool,
}

fn parse_chunk(data: &str) -> Result<ModelChunk> {
    let parsed: GenerateContentResponse = serde_json::from_str(data)?;
    parsed.into_chunk()
}

fn parse_error(status: u16, body: &str) -> OverlayError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| truncate(body.trim(), MAX_ERROR_BODY));

    if status == 401 || status == 403 || message.contains("API key not valid") {
        return OverlayError::AuthError { message };
    }

    OverlayError::ModelApiError { status, message }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WireRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireRequestPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    #[serde(alias = "mime_type")]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_modalities: Vec<ResponseModality>,
}

impl GenerateContentRequest {
    fn from_model_request(request: &ModelRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::Image(image) => WireRequestPart::InlineData {
                    inline_data: WireBlob {
                        mime_type: image.mime_type.clone(),
                        data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                    },
                },
                RequestPart::Text(text) => WireRequestPart::Text { text: text.clone() },
            })
            .collect();

        Self {
            contents: vec![WireContent { role: "user", parts }],
            generation_config: WireGenerationConfig {
                response_modalities: request.response_modalities.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<WireBlob>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    fn into_chunk(self) -> Result<ModelChunk> {
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                return Err(OverlayError::ContentBlocked {
                    reason: feedback
                        .block_reason_message
                        .unwrap_or_else(|| format!("prompt blocked: {}", reason)),
                });
            }
        }

        // streamed chunks may carry only usage metadata
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(ModelChunk::default());
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if BLOCKING_FINISH_REASONS.contains(&reason) {
                return Err(OverlayError::ContentBlocked {
                    reason: format!("finish reason {}", reason),
                });
            }
        }

        let mut parts = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(blob) = part.inline_data {
                if blob.data.is_empty() {
                    continue;
                }
                let data = base64::engine::general_purpose::STANDARD
                    .decode(blob.data.as_bytes())
                    .map_err(|e| OverlayError::MalformedResponse {
                        message: format!("invalid base64 image data: {}", e),
                    })?;
                parts.push(ResponsePart::Image(ImagePart {
                    data,
                    mime_type: blob.mime_type,
                }));
            } else if let Some(text) = part.text {
                if !part.thought && !text.is_empty() {
                    parts.push(ResponsePart::Text(text));
                }
            }
        }

        Ok(ModelChunk { parts })
    }
}
