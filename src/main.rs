use clap::Parser;
use glasses_overlay::config::cli::{print_report, AddGlassesArgs, Cli, Command, MixArgs};
use glasses_overlay::utils::logger;
use glasses_overlay::utils::validation::{validate_existing_file, Validate};
use glasses_overlay::{
    CompositeReport, Compositor, GeminiClient, ImageFetcher, LocalArtifactStore, Result,
    ServiceConfig,
};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("Error: {}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.severity().exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ServiceConfig::load(cli.config.as_deref())?;
    tracing::debug!("Using model {}", config.model_name);

    match cli.command {
        Command::Mix(args) => mix(&config, &args).await,
        Command::AddGlasses(args) => add_glasses(&config, &args).await,
    }
}

async fn mix(config: &ServiceConfig, args: &MixArgs) -> Result<()> {
    args.validate()?;

    let compositor = build_compositor(config, &args.output_dir)?;
    let report = compositor.run(&args.to_job()).await?;
    report_to_stdout(&report)
}

async fn add_glasses(config: &ServiceConfig, args: &AddGlassesArgs) -> Result<()> {
    let glasses = args.glasses_or(config);
    validate_existing_file(&glasses)?;

    let job = args.to_job(glasses)?;
    let output_dir = args.output_dir_or(config);

    let compositor = build_compositor(config, output_dir)?;
    let report = compositor.run(&job).await?;
    report_to_stdout(&report)
}

fn build_compositor(
    config: &ServiceConfig,
    output_dir: &Path,
) -> Result<Compositor<GeminiClient, LocalArtifactStore>> {
    let model = GeminiClient::new(config.gemini_settings()?)?;
    let fetcher = ImageFetcher::new(config.download_timeout())?;
    Ok(Compositor::new(
        model,
        LocalArtifactStore::new(output_dir),
        fetcher,
    ))
}

fn report_to_stdout(report: &CompositeReport) -> Result<()> {
    print_report(report, &mut std::io::stdout().lock())?;
    Ok(())
}
