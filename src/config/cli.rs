use crate::config::ServiceConfig;
use crate::core::compositor::glasses_overlay_job;
use crate::core::prompt::{default_remix_prompt, resolve_prompt};
use crate::domain::model::{CompositeJob, CompositeReport, Delivery, ImageSource, ResponseModality};
use crate::utils::error::{OverlayError, Result};
use crate::utils::validation::{validate_existing_file, Validate};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAX_MIX_IMAGES: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "glasses-overlay")]
#[command(about = "Composite images with a generative image model")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remix 1-5 local images into a new one
    Mix(MixArgs),
    /// Put the glasses overlay on every face in a photo
    AddGlasses(AddGlassesArgs),
}

#[derive(Debug, Clone, Args)]
pub struct MixArgs {
    /// Input image; repeat the flag for several images
    #[arg(short = 'i', long = "image", required = true)]
    pub images: Vec<PathBuf>,

    /// Instruction for the model; defaults depend on the number of images
    #[arg(long)]
    pub prompt: Option<String>,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Wait for the whole response instead of streaming it
    #[arg(long)]
    pub no_stream: bool,
}

impl MixArgs {
    pub fn to_job(&self) -> CompositeJob {
        let prompt = resolve_prompt(
            self.prompt.as_deref(),
            default_remix_prompt(self.images.len()),
        );
        let delivery = if self.no_stream {
            Delivery::Blocking
        } else {
            Delivery::Streaming
        };

        CompositeJob::new(
            self.images.iter().cloned().map(ImageSource::Path).collect(),
            prompt,
        )
        .with_modalities(vec![ResponseModality::Image, ResponseModality::Text])
        .with_delivery(delivery)
        .with_prefix("remixed_image")
    }
}

impl Validate for MixArgs {
    fn validate(&self) -> Result<()> {
        let count = self.images.len();
        if !(1..=MAX_MIX_IMAGES).contains(&count) {
            return Err(OverlayError::ValidationError {
                message: format!(
                    "mix takes 1 to {} images, got {}",
                    MAX_MIX_IMAGES, count
                ),
            });
        }
        for image in &self.images {
            validate_existing_file(image)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct AddGlassesArgs {
    /// Photo to edit, as an http(s) URL or a local path
    #[arg(short = 'i', long)]
    pub image: String,

    /// Glasses overlay image; defaults to GLASSES_PATH
    #[arg(short, long)]
    pub glasses: Option<PathBuf>,

    /// Replace the built-in overlay instruction
    #[arg(long)]
    pub prompt: Option<String>,

    /// Defaults to OUTPUT_DIR
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl AddGlassesArgs {
    pub fn to_job(&self, glasses: PathBuf) -> Result<CompositeJob> {
        let photo = ImageSource::parse(&self.image)?;
        Ok(glasses_overlay_job(photo, glasses, self.prompt.as_deref()))
    }

    /// `--glasses`, else the configured overlay.
    pub fn glasses_or(&self, config: &ServiceConfig) -> PathBuf {
        self.glasses
            .clone()
            .unwrap_or_else(|| config.glasses_path.clone())
    }

    /// `--output-dir`, else the configured output directory.
    pub fn output_dir_or<'a>(&'a self, config: &'a ServiceConfig) -> &'a Path {
        self.output_dir
            .as_deref()
            .unwrap_or(config.output_dir.as_path())
    }
}

/// Prints the model's text parts, then one `File saved to:` line per image.
pub fn print_report<W: Write>(report: &CompositeReport, out: &mut W) -> std::io::Result<()> {
    for text in &report.texts {
        writeln!(out, "{}", text)?;
    }
    for artifact in &report.artifacts {
        writeln!(out, "File saved to: {}", artifact.path.display())?;
    }
    Ok(())
}
