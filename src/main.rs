use clap::Parser;
use image::ImageReader;
use std::path::PathBuf;
use time::OffsetDateTime;

use bladescan::annotate::draw_detections;
use bladescan::{
    CriticalityTable, DefectReport, Ensemble, EnsembleConfig, RecordedLoader, SuppressionMode,
};

#[derive(Parser, Debug)]
#[command(name = "bladescan")]
#[command(about = "Detect surface defects on turbine blade images with a detector ensemble")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Ensemble configuration file (TOML); built-in defaults are used if it doesn't exist
    #[arg(short, long, value_name = "FILE", default_value = "bladescan.toml")]
    config: PathBuf,

    /// Override the confidence threshold passed to every detector
    #[arg(long, value_name = "TAU")]
    conf: Option<f32>,

    /// Override the IoU threshold used for suppression
    #[arg(long, value_name = "THETA")]
    iou: Option<f32>,

    /// Only let boxes of the same class suppress each other
    #[arg(long)]
    per_class: bool,

    /// Run detectors concurrently
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Save a copy of the image with detections drawn on it
    #[arg(long, value_name = "PATH")]
    annotate_out: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = EnsembleConfig::load_or_default(&args.config)?;
    if let Some(conf) = args.conf {
        config.confidence_threshold = conf;
    }
    if let Some(iou) = args.iou {
        config.iou_threshold = iou;
    }
    if args.per_class {
        config.suppression = SuppressionMode::PerClass;
    }
    config.parallel |= args.parallel;

    log::info!("Loading image: {:?}", args.image_path);
    let img = ImageReader::open(&args.image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();
    log::debug!("Image loaded: {}x{}", img.width(), img.height());

    let mut ensemble = Ensemble::from_config(&config, &RecordedLoader)?;
    if let Some(debug_dir) = args.debug_out {
        ensemble = ensemble.with_debug(debug_dir)?;
    }

    let analysis = ensemble.analyze(&img)?;
    if analysis.all_detectors_failed() {
        anyhow::bail!("Analysis failed: every detector failed on {:?}", args.image_path);
    }

    let table = CriticalityTable::with_overrides(&config.criticality);
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let report = DefectReport::build(&analysis, ensemble.catalog(), &table, now)?;

    if let Some(path) = &args.annotate_out {
        let annotated = draw_detections(&img, &analysis, ensemble.catalog(), &table);
        annotated
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
        log::info!("Annotated image saved to {:?}", path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    Ok(())
}
