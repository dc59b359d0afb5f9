use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Failed to download {url}: {source}")]
    DownloadError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Model request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Model API error: {status} - {message}")]
    ModelApiError { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Content blocked: {reason}")]
    ContentBlocked { reason: String },

    #[error("No image was generated")]
    NoImageGenerated { text: Option<String> },

    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Input file not found: {}", path.display())]
    MissingInputError { path: PathBuf },

    #[error("Could not determine MIME type for {}", path.display())]
    UnknownMimeType { path: PathBuf },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Model,
    Storage,
    Configuration,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit status for a failed CLI run.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Medium => 2, // worth retrying
            Self::High => 1,
            Self::Critical => 3,
        }
    }
}

impl OverlayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DownloadError { .. } | Self::ApiError(_) => ErrorCategory::Network,
            Self::ModelApiError { .. }
            | Self::AuthError { .. }
            | Self::ContentBlocked { .. }
            | Self::NoImageGenerated { .. }
            | Self::MalformedResponse { .. }
            | Self::SerializationError(_) => ErrorCategory::Model,
            Self::IoError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::MissingInputError { .. }
            | Self::UnknownMimeType { .. }
            | Self::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // transient, a second attempt may succeed
            Self::DownloadError { .. } | Self::ApiError(_) => ErrorSeverity::Medium,
            Self::ModelApiError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            Self::NoImageGenerated { .. } => ErrorSeverity::Medium,
            Self::IoError(_)
            | Self::AuthError { .. }
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// True for failures caused by fetching the caller's source image.
    pub fn is_download_failure(&self) -> bool {
        matches!(self, Self::DownloadError { .. })
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DownloadError { url, .. } => format!("Could not download the image at {}", url),
            Self::ApiError(_) => "Could not reach the image model".to_string(),
            Self::ModelApiError { status, message } => {
                format!("The image model rejected the request ({}): {}", status, message)
            }
            Self::AuthError { .. } => "The image model rejected the API key".to_string(),
            Self::ContentBlocked { reason } => {
                format!("The image model refused to process the request: {}", reason)
            }
            Self::NoImageGenerated { text: Some(text) } => {
                format!("No image was generated. The model said: {}", text)
            }
            Self::NoImageGenerated { text: None } => "No image was generated".to_string(),
            Self::MissingInputError { path } => {
                format!("Input image does not exist: {}", path.display())
            }
            Self::UnknownMimeType { path } => {
                format!("Unsupported image type: {}", path.display())
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and that the URL is reachable",
            ErrorCategory::Model => match self {
                Self::AuthError { .. } => "Set a valid GEMINI_API_KEY",
                Self::ContentBlocked { .. } => "Try a different photo or instruction",
                _ => "Retry the request; the model output is not deterministic",
            },
            ErrorCategory::Storage => "Make sure the output directory is writable",
            ErrorCategory::Configuration => "Review the environment variables and config file",
            ErrorCategory::Input => "Use existing png, jpeg, webp, heic or gif files",
        }
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_and_category() {
        let err = OverlayError::ModelApiError {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Model);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = OverlayError::ModelApiError {
            status: 400,
            message: "bad request".into(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = OverlayError::MissingConfigError {
            field: "GEMINI_API_KEY".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_no_image_message_includes_model_text() {
        let err = OverlayError::NoImageGenerated {
            text: Some("I can't find a face".into()),
        };
        assert_eq!(err.to_string(), "No image was generated");
        assert!(err.user_friendly_message().contains("I can't find a face"));
    }

    #[test]
    fn test_missing_input_display() {
        let err = OverlayError::MissingInputError {
            path: PathBuf::from("images/glasses.png"),
        };
        assert_eq!(err.to_string(), "Input file not found: images/glasses.png");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(!err.is_download_failure());
    }

    #[test]
    fn test_exit_codes_by_severity() {
        let retry = OverlayError::ModelApiError {
            status: 429,
            message: "quota".into(),
        };
        assert_eq!(retry.severity().exit_code(), 2);

        let input = OverlayError::MissingInputError {
            path: PathBuf::from("glasses.png"),
        };
        assert_eq!(input.severity().exit_code(), 1);

        let config = OverlayError::MissingConfigError {
            field: "GEMINI_API_KEY".into(),
        };
        assert_eq!(config.severity().exit_code(), 3);
    }
}
