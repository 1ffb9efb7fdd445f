//! Circle search: replay a recorded circle gesture and crop the camera image under it.

use anyhow::{bail, Context, Result};
use circle_search::{config::Config, replay::Recording};
use clap::Parser;
use image::{imageops, Rgba, RgbaImage};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded stroke session (YAML format)
    #[arg(short, long)]
    recording: PathBuf,

    /// Camera image the crop is taken from; a test pattern is used when omitted
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Where to write the crop of the last finished curve
    #[arg(short, long, default_value = "crop.png")]
    output: PathBuf,

    /// Speed filter override (truncated_mean[:k], mean, median)
    #[arg(short, long)]
    filter: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Circle Search");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(filter) = args.filter {
        config.tracker.speed_filter = filter;
    }
    config.validate()?;

    let recording = Recording::from_file(&args.recording)
        .with_context(|| format!("Failed to load recording {}", args.recording.display()))?;
    info!(
        "Loaded {} samples from {}",
        recording.samples.len(),
        args.recording.display()
    );

    let image = load_camera_image(args.image.as_ref(), &recording)?;
    let outcome = circle_search::replay::replay(&recording, image, &config)?;

    for (curve, reason) in &outcome.failures {
        log::warn!("Curve {curve} produced no visuals: {reason}");
    }

    let Some(visuals) = outcome.visuals else {
        bail!("No visuals produced ({} curve(s) finished)", outcome.finished.len());
    };

    for (name, panel) in [("Image", &visuals.image_panel), ("Companion", &visuals.companion_panel)] {
        info!(
            "{} panel: center {}, normal {:?}, {:.3} x {:.3} m",
            name,
            panel.center(),
            panel.transform.z_axis(),
            panel.width,
            panel.height
        );
        log::debug!("{} panel transform:{}", name, panel.transform.to_homogeneous());
    }

    visuals
        .image
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        "Wrote {}x{} crop to {}",
        visuals.image.width(),
        visuals.image.height(),
        args.output.display()
    );

    Ok(())
}

/// Load the camera image at the recording's resolution
fn load_camera_image(path: Option<&PathBuf>, recording: &Recording) -> Result<RgbaImage> {
    let (width, height) = (recording.camera.width, recording.camera.height);
    let Some(path) = path else {
        info!("No image given, using a {}x{} test pattern", width, height);
        return Ok(RgbaImage::from_fn(width, height, |x, y| {
            if (x / 40 + y / 40) % 2 == 0 {
                Rgba([230, 230, 230, 255])
            } else {
                Rgba([40, 90, 160, 255])
            }
        }));
    };

    let image = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    if image.dimensions() == (width, height) {
        return Ok(image);
    }

    log::warn!(
        "Image is {}x{}, camera is {}x{}; resizing",
        image.width(),
        image.height(),
        width,
        height
    );
    Ok(imageops::resize(&image, width, height, imageops::FilterType::Triangle))
}
