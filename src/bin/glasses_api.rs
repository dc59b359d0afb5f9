use anyhow::Context;
use glasses_overlay::config::{LogFormat, ServiceConfig};
use glasses_overlay::server::{build_router, shutdown_signal, AppState};
use glasses_overlay::utils::logger;
use glasses_overlay::utils::validation::Validate;
use glasses_overlay::{Compositor, GeminiClient, ImageFetcher, LocalArtifactStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load(None).context("Failed to load configuration")?;
    logger::init_server_logger(config.log_format == LogFormat::Json);

    config.validate().context("Invalid configuration")?;

    if !config.glasses_path.is_file() {
        tracing::warn!(
            "Glasses image not found at {}; requests will fail until it exists",
            config.glasses_path.display()
        );
    }
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let model = GeminiClient::new(config.gemini_settings()?)?;
    let fetcher = ImageFetcher::new(config.download_timeout())?;
    let compositor = Compositor::new(
        model,
        LocalArtifactStore::new(config.output_dir.clone()),
        fetcher,
    );

    let addr = config.bind_address();
    let public_url = config.public_base_url();
    let app = build_router(AppState::new(config, compositor));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Starting Glasses Overlay API on {}", addr);
    tracing::info!("API will be available at: {}", public_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
