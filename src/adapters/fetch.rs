use crate::domain::model::{ImagePart, ImageSource};
use crate::utils::error::{OverlayError, Result};
use crate::utils::media::{sniff_download_mime, ImageFormat};
use crate::utils::validation::validate_existing_file;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads input images from URLs or the local filesystem.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Checks local sources without touching the network.
    pub fn preflight(&self, sources: &[ImageSource]) -> Result<()> {
        for source in sources {
            if let ImageSource::Path(path) = source {
                validate_existing_file(path)?;
                local_mime(path)?;
            }
        }
        Ok(())
    }

    pub async fn fetch(&self, source: &ImageSource) -> Result<ImagePart> {
        match source {
            ImageSource::Url(url) => self.download(url.as_str()).await,
            ImageSource::Path(path) => read_local(path).await,
        }
    }

    async fn download(&self, url: &str) -> Result<ImagePart> {
        tracing::info!("Downloading image from: {}", url);

        let download_error = |source: reqwest::Error| OverlayError::DownloadError {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(download_error)?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = response.bytes().await.map_err(download_error)?.to_vec();
        if data.is_empty() {
            return Err(OverlayError::ValidationError {
                message: format!("downloaded image from {} is empty", url),
            });
        }

        let mime_type = sniff_download_mime(content_type.as_deref(), &data);
        tracing::debug!("Downloaded {} bytes ({})", data.len(), mime_type);

        Ok(ImagePart { data, mime_type })
    }
}

async fn read_local(path: &Path) -> Result<ImagePart> {
    let mime_type = local_mime(path)?.to_string();
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OverlayError::MissingInputError {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(ImagePart { data, mime_type })
}

fn local_mime(path: &Path) -> Result<&'static str> {
    ImageFormat::from_path(path)
        .map(|format| format.mime_type())
        .ok_or_else(|| OverlayError::UnknownMimeType {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glasses.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();

        let fetcher = ImageFetcher::new(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();
        let part = fetcher.fetch(&ImageSource::Path(path)).await.unwrap();

        assert_eq!(part.mime_type, "image/png");
        assert_eq!(part.data, b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_fetch_missing_local_file() {
        let fetcher = ImageFetcher::new(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();
        let result = fetcher
            .fetch(&ImageSource::Path(PathBuf::from("/nonexistent/glasses.png")))
            .await;
        assert!(matches!(result, Err(OverlayError::MissingInputError { .. })));
    }

    #[test]
    fn test_preflight_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let fetcher = ImageFetcher::new(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();
        assert!(matches!(
            fetcher.preflight(&[ImageSource::Path(path)]),
            Err(OverlayError::UnknownMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_uses_content_type() {
        let server = MockServer::start_async().await;
        let image_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/photo");
                then.status(200)
                    .header("Content-Type", "image/webp")
                    .body("RIFF....WEBPVP8 ");
            })
            .await;

        let fetcher = ImageFetcher::new(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();
        let source = ImageSource::parse(&server.url("/photo")).unwrap();
        let part = fetcher.fetch(&source).await.unwrap();

        image_mock.assert_async().await;
        assert_eq!(part.mime_type, "image/webp");
    }

    #[tokio::test]
    async fn test_download_http_error_is_download_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.jpg");
                then.status(404);
            })
            .await;

        let fetcher = ImageFetcher::new(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();
        let source = ImageSource::parse(&server.url("/missing.jpg")).unwrap();
        let err = fetcher.fetch(&source).await.unwrap_err();

        assert!(err.is_download_failure());
    }
}
