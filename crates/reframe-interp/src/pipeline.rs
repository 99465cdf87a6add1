//! Conversion pipeline: decode, resample, synthesize, encode

use crate::resampler::{plan_downsample, plan_upsample, Direction, InterpolationPlan};
use crate::strategy::synthesize;
use reframe_core::{
    validate_fps, Config, Error, FrameSequence, FrameSink, FrameSource, ProgressSink, Result,
    SinkConfig, Strategy,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// What a conversion did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub input_frames: usize,
    pub output_frames: usize,
    pub source_fps: f64,
    pub target_fps: f64,
    pub step: usize,
    pub direction: Direction,
    /// Synthesis strategy, `None` when frames were only dropped
    pub strategy: Option<Strategy>,
    pub width: u32,
    pub height: u32,
}

/// Runs one frame-rate conversion with a fixed configuration
pub struct ConversionPipeline {
    config: Config,
}

impl ConversionPipeline {
    /// Create a new pipeline, rejecting invalid configuration up front
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Conversion pipeline: target {} fps, strategy {}, codec {}",
            config.target_fps, config.strategy, config.codec
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Decode every frame of `source`, checking each against the first
    pub fn read_all(source: &mut dyn FrameSource) -> Result<FrameSequence> {
        let mut sequence = FrameSequence::new();
        while let Some(frame) = source.next_frame()? {
            sequence.push(frame)?;
        }
        debug!("Decoded {} frames", sequence.len());
        Ok(sequence)
    }

    /// Resample `sequence` from `source_fps` to the configured rate
    pub fn convert(
        &self,
        sequence: FrameSequence,
        source_fps: f64,
        progress: &mut dyn ProgressSink,
    ) -> Result<(FrameSequence, ConversionSummary)> {
        validate_fps(source_fps, "source")?;
        let shape = sequence
            .shape()
            .ok_or_else(|| Error::Config("source produced no frames".into()))?;
        let plan = InterpolationPlan::for_rates(sequence.len(), source_fps, self.config.target_fps)?;

        let (output, strategy) = match plan.direction {
            Direction::Upsample => {
                let mut buffer = plan_upsample(&sequence, plan.new_length)?;
                drop(sequence);
                synthesize(&mut buffer, self.config.strategy, &self.config.flow, progress)?;
                (buffer.into_sequence()?, Some(self.config.strategy))
            }
            Direction::Downsample => (plan_downsample(&sequence, plan.new_length, progress)?, None),
        };

        let summary = ConversionSummary {
            input_frames: plan.old_length,
            output_frames: output.len(),
            source_fps,
            target_fps: self.config.target_fps,
            step: plan.step,
            direction: plan.direction,
            strategy,
            width: shape.width,
            height: shape.height,
        };
        info!(
            "Converted {} -> {} frames ({:?}, step {})",
            summary.input_frames, summary.output_frames, summary.direction, summary.step
        );

        Ok((output, summary))
    }

    /// Decode `source`, convert, and encode into a sink opened by `open_sink`
    pub fn run<F>(
        &self,
        source: &mut dyn FrameSource,
        output: &Path,
        open_sink: F,
        progress: &mut dyn ProgressSink,
    ) -> Result<ConversionSummary>
    where
        F: FnOnce(&SinkConfig) -> Result<Box<dyn FrameSink>>,
    {
        let source_fps = source.info().frame_rate;
        let sequence = Self::read_all(source)?;
        let (frames, summary) = self.convert(sequence, source_fps, progress)?;

        let sink_config = SinkConfig {
            path: output.to_path_buf(),
            frame_rate: self.config.target_fps,
            width: summary.width,
            height: summary.height,
            color: self.config.color,
            codec: self.config.codec,
        };
        let mut sink = open_sink(&sink_config)?;

        // The sink is closed even when a write fails; the write error wins
        let written = frames.into_iter().try_for_each(|frame| sink.write(&frame));
        let closed = sink.close();
        written?;
        closed?;

        info!("Wrote {} frames to {:?}", sink.frames_written(), output);
        Ok(summary)
    }
}
