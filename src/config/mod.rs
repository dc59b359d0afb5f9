#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::fetch::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::adapters::gemini::{GeminiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::utils::error::{OverlayError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_config::TomlConfig;

pub const CONFIG_FILE_ENV: &str = "OVERLAY_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(OverlayError::InvalidConfigValueError {
                field: "LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected `pretty` or `json`".to_string(),
            }),
        }
    }
}

/// Settings shared by the HTTP service and the command-line tool.
///
/// Resolved in layers: built-in defaults, then the optional TOML file, then
/// environment variables.
///
/// | Env var                 | Default                                     |
/// |-------------------------|---------------------------------------------|
/// | `GEMINI_API_KEY`        | required                                    |
/// | `MODEL_NAME`            | `gemini-2.5-flash-image-preview`            |
/// | `GEMINI_BASE_URL`       | `https://generativelanguage.googleapis.com` |
/// | `GLASSES_PATH`          | `images/glasses.png`                        |
/// | `OUTPUT_DIR`            | `output`                                    |
/// | `HOST`                  | `0.0.0.0`                                   |
/// | `PORT`                  | `8000`                                      |
/// | `PUBLIC_URL`            | `RAILWAY_PUBLIC_DOMAIN`, else `localhost:<PORT>` |
/// | `DOWNLOAD_TIMEOUT_SECS` | `30`                                        |
/// | `MODEL_TIMEOUT_SECS`    | unset                                       |
/// | `LOG_FORMAT`            | `pretty`                                    |
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub model_name: String,
    pub gemini_base_url: String,
    pub glasses_path: PathBuf,
    pub output_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub public_url: Option<String>,
    pub download_timeout_secs: u64,
    pub model_timeout_secs: Option<u64>,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            glasses_path: PathBuf::from("images/glasses.png"),
            output_dir: PathBuf::from("output"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
            model_timeout_secs: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServiceConfig {
    /// Loads `.env`, the TOML file (explicit path or `OVERLAY_CONFIG`) and the
    /// process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));
        if let Some(file) = file {
            tracing::debug!("Loading configuration file {}", file.display());
            config.apply_file(TomlConfig::from_file(&file)?)?;
        }

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: TomlConfig) -> Result<()> {
        let TomlConfig {
            gemini,
            server,
            paths,
            logging,
        } = file;

        if gemini.api_key.is_some() {
            self.api_key = gemini.api_key;
        }
        if let Some(model) = gemini.model {
            self.model_name = model;
        }
        if let Some(base_url) = gemini.base_url {
            self.gemini_base_url = base_url;
        }
        if gemini.timeout_seconds.is_some() {
            self.model_timeout_secs = gemini.timeout_seconds;
        }
        if let Some(host) = server.host {
            self.host = host;
        }
        if let Some(port) = server.port {
            self.port = port;
        }
        if server.public_url.is_some() {
            self.public_url = server.public_url;
        }
        if let Some(secs) = server.download_timeout_seconds {
            self.download_timeout_secs = secs;
        }
        if let Some(glasses) = paths.glasses {
            self.glasses_path = glasses;
        }
        if let Some(output_dir) = paths.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(format) = logging.format {
            self.log_format = LogFormat::parse(&format)?;
        }
        Ok(())
    }

    /// Overrides fields from environment-style variables. Empty values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = get("MODEL_NAME") {
            self.model_name = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            self.gemini_base_url = base_url;
        }
        if let Some(path) = get("GLASSES_PATH") {
            self.glasses_path = PathBuf::from(path);
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            self.port = parse_number("PORT", &port)?;
        }
        if let Some(public_url) = get("PUBLIC_URL").or_else(|| get("RAILWAY_PUBLIC_DOMAIN")) {
            self.public_url = Some(public_url);
        }
        if let Some(secs) = get("DOWNLOAD_TIMEOUT_SECS") {
            self.download_timeout_secs = parse_number("DOWNLOAD_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("MODEL_TIMEOUT_SECS") {
            self.model_timeout_secs = Some(parse_number("MODEL_TIMEOUT_SECS", &secs)?);
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format)?;
        }
        Ok(())
    }

    /// Base URL used to build links to generated images.
    ///
    /// A bare host gets `https://` when it is a Railway domain and `http://`
    /// otherwise; a trailing slash is removed.
    pub fn public_base_url(&self) -> String {
        let raw = self
            .public_url
            .clone()
            .unwrap_or_else(|| format!("localhost:{}", self.port));
        let raw = raw.trim().trim_end_matches('/');

        if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else if raw.contains("railway") {
            format!("https://{}", raw)
        } else {
            format!("http://{}", raw)
        }
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn gemini_settings(&self) -> Result<GeminiSettings> {
        let api_key = validate_required_field("GEMINI_API_KEY", &self.api_key)?;

        Ok(GeminiSettings {
            api_key: api_key.clone(),
            model: self.model_name.clone(),
            base_url: self.gemini_base_url.clone(),
            timeout: self.model_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        let api_key = validate_required_field("GEMINI_API_KEY", &self.api_key)?;
        validate_non_empty_string("GEMINI_API_KEY", api_key)?;
        if api_key.contains("${") {
            return Err(OverlayError::InvalidConfigValueError {
                field: "GEMINI_API_KEY".to_string(),
                value: api_key.clone(),
                reason: "unresolved placeholder".to_string(),
            });
        }

        validate_non_empty_string("MODEL_NAME", &self.model_name)?;
        validate_url("GEMINI_BASE_URL", &self.gemini_base_url)?;
        validate_path("OUTPUT_DIR", &self.output_dir.to_string_lossy())?;
        validate_path("GLASSES_PATH", &self.glasses_path.to_string_lossy())?;
        validate_range("PORT", self.port, 1, u16::MAX)?;
        validate_range("DOWNLOAD_TIMEOUT_SECS", self.download_timeout_secs, 1, 3600)?;
        validate_url("PUBLIC_URL", &self.public_base_url())?;
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| OverlayError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
