//! reframe - Frame-rate conversion for video
//!
//! Raises the frame rate of a clip by duplicating, blending or
//! motion-compensating frames, or lowers it by dropping frames.

use anyhow::{Context, Result};
use clap::Parser;
use reframe_core::{ColorMode, Config, FlowConfig, FourCc, Strategy, TracingProgress};
use reframe_interp::ConversionPipeline;
use reframe_io::{codec_for_path, open_sink, open_source};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// reframe - Convert a video to a new frame rate
#[derive(Parser, Debug)]
#[command(name = "reframe")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input: a directory of PNG frames or a raw .h264 stream
    input: PathBuf,

    /// Output: a directory for PNG frames or a .h264 file
    output: PathBuf,

    /// Target frame rate
    #[arg(short, long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=300))]
    fps: u32,

    /// Frame rate of the input (neither input format records one)
    #[arg(short, long, default_value = "30")]
    input_fps: f64,

    /// Strategy for new frames: dup, blend, mci-dense or mci-sparse
    #[arg(short, long, default_value = "dup")]
    strategy: String,

    /// Output codec tag (H264, AVC1, X264 or PNG); derived from the output path if omitted
    #[arg(short, long)]
    codec: Option<String>,

    /// Write single-channel output
    #[arg(short, long)]
    grayscale: bool,

    /// Horn-Schunck smoothness weight
    #[arg(long, default_value = "15")]
    flow_smoothness: f32,

    /// Horn-Schunck iterations
    #[arg(long, default_value = "64")]
    flow_iterations: usize,

    /// Lucas-Kanade half window in pixels
    #[arg(long, default_value = "3")]
    flow_window: usize,

    /// Fraction of the estimated motion applied to new frames
    #[arg(long, default_value = "0.5")]
    temporal_scale: f32,

    /// Write a JSON summary of the conversion to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("reframe v{}", env!("CARGO_PKG_VERSION"));

    let strategy: Strategy = args.strategy.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let codec: FourCc = match &args.codec {
        Some(tag) => tag.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => codec_for_path(&args.output),
    };
    let color = if args.grayscale {
        ColorMode::Grayscale
    } else {
        ColorMode::Color
    };
    let flow = FlowConfig {
        smoothness: args.flow_smoothness,
        iterations: args.flow_iterations,
        window_radius: args.flow_window,
        temporal_scale: args.temporal_scale,
        ..FlowConfig::default()
    };

    let config = Config::new()
        .with_target_fps(args.fps as f64)
        .with_strategy(strategy)
        .with_codec(codec)
        .with_color(color)
        .with_flow(flow);
    let pipeline = ConversionPipeline::new(config)?;

    let mut source = open_source(&args.input, args.input_fps)
        .with_context(|| format!("Failed to open {:?}", args.input))?;
    let mut progress = TracingProgress::new(format!("Converting ({})", strategy));

    let summary = pipeline.run(&mut source, &args.output, open_sink, &mut progress)?;

    info!(
        "Done: {} frames @ {} fps -> {} frames @ {} fps",
        summary.input_frames, summary.source_fps, summary.output_frames, summary.target_fps
    );

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Summary written to {:?}", path);
    }

    Ok(())
}
