//! Temporal resampling
//!
//! Upsampling places input frame `i` at output slot `i * step` and leaves every
//! other slot pending. Downsampling keeps every `step`-th input frame.

use crate::buffer::{OutputBuffer, Slot};
use reframe_core::{
    normalize, validate_fps, Error, FrameSequence, ProgressSink, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Upsample,
    Downsample,
}

/// Step between anchors derived from `(old_length, new_length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationPlan {
    pub old_length: usize,
    pub new_length: usize,
    pub step: usize,
    pub direction: Direction,
}

impl InterpolationPlan {
    /// `step = round(new_length / old_length)`, ties to even
    pub fn upsample(old_length: usize, new_length: usize) -> Result<Self> {
        Self::build(old_length, new_length, Direction::Upsample)
    }

    /// `step = round(old_length / new_length)`, ties to even
    pub fn downsample(old_length: usize, new_length: usize) -> Result<Self> {
        Self::build(old_length, new_length, Direction::Downsample)
    }

    /// Choose direction and output length from a pair of frame rates
    ///
    /// Raising the rate multiplies the length by `round(target / source)`;
    /// otherwise the length is divided by `round(source / target)` and rounded.
    /// Every rounding here sends halves to the even neighbour, so 24 -> 60 fps
    /// doubles the length rather than tripling it.
    pub fn for_rates(old_length: usize, source_fps: f64, target_fps: f64) -> Result<Self> {
        validate_fps(source_fps, "source")?;
        validate_fps(target_fps, "target")?;

        if target_fps > source_fps {
            let multiplier = (target_fps / source_fps).round_ties_even() as usize;
            Self::upsample(old_length, old_length * multiplier)
        } else {
            let divisor = (source_fps / target_fps).round_ties_even() as usize;
            let new_length = (old_length as f64 / divisor as f64).round_ties_even() as usize;
            Self::downsample(old_length, new_length)
        }
    }

    fn build(old_length: usize, new_length: usize, direction: Direction) -> Result<Self> {
        if old_length == 0 {
            return Err(Error::Config("cannot resample an empty sequence".into()));
        }
        if new_length == 0 {
            return Err(Error::Config(format!(
                "{} frames would resample to an empty sequence",
                old_length
            )));
        }

        let (numerator, denominator) = match direction {
            Direction::Upsample => (new_length, old_length),
            Direction::Downsample => (old_length, new_length),
        };
        let step = (numerator as f64 / denominator as f64).round_ties_even() as usize;
        if step == 0 {
            return Err(Error::ZeroStep {
                old_length,
                new_length,
            });
        }

        Ok(Self {
            old_length,
            new_length,
            step,
            direction,
        })
    }

    /// Output slots that receive an input frame when upsampling
    pub fn anchor_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.old_length)
            .map(move |i| i * self.step)
            .take_while(move |&j| j < self.new_length)
    }

    /// Length the plan actually produces
    ///
    /// Downsampling yields `ceil(old_length / step)` frames, which only equals
    /// `new_length` when the step divides `old_length`.
    pub fn output_length(&self) -> usize {
        match self.direction {
            Direction::Upsample => self.new_length,
            Direction::Downsample => self.old_length.div_ceil(self.step),
        }
    }
}

/// Place every input frame into a `new_length` buffer, leaving gaps pending
pub fn plan_upsample(sequence: &FrameSequence, new_length: usize) -> Result<OutputBuffer> {
    let plan = InterpolationPlan::upsample(sequence.len(), new_length)?;
    let shape = sequence
        .shape()
        .ok_or_else(|| Error::Config("cannot resample an empty sequence".into()))?;

    let mut slots = vec![Slot::Pending; new_length];
    let mut anchors = 0;
    for (i, j) in plan.anchor_positions().enumerate() {
        if let Some(frame) = sequence.get(i) {
            slots[j] = Slot::Filled(frame.clone());
            anchors += 1;
        }
    }

    info!(
        "Upsample plan: {} -> {} frames, step {} ({} anchors)",
        plan.old_length, new_length, plan.step, anchors
    );

    Ok(OutputBuffer::new(slots, plan.step, anchors, shape))
}

/// Keep every `step`-th frame starting at index 0
pub fn plan_downsample(
    sequence: &FrameSequence,
    new_length: usize,
    progress: &mut dyn ProgressSink,
) -> Result<FrameSequence> {
    let plan = InterpolationPlan::downsample(sequence.len(), new_length)?;
    let old_length = plan.old_length;

    let mut out = FrameSequence::new();
    let mut i = 0;
    while i < old_length {
        if let Some(frame) = sequence.get(i) {
            out.push(frame.clone())?;
        }
        progress.report(normalize(i, 0, old_length - 1));
        i += plan.step;
    }
    progress.report(100);

    if out.len() != new_length {
        debug!(
            "Downsample stride {} yields {} frames instead of the requested {}",
            plan.step,
            out.len(),
            new_length
        );
    }
    info!(
        "Downsample plan: {} -> {} frames, step {}",
        old_length,
        out.len(),
        plan.step
    );

    Ok(out)
}
