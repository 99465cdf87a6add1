//! Frame synthesis strategies
//!
//! Each strategy fills the pending slots of an [`OutputBuffer`] in place.
//! Anchors placed by the resampler are never touched.

mod blend;
mod chunk;
mod duplicate;
mod motion;

pub use blend::Blend;
pub use duplicate::fill_duplicates;
pub use motion::MotionCompensate;

use crate::buffer::OutputBuffer;
use reframe_core::{FlowConfig, Frame, ProgressSink, Result, Strategy};
use tracing::info;

/// Synthesizes one frame between a predecessor and a target frame
pub trait FrameSynthesizer {
    fn name(&self) -> &'static str;

    fn synthesize(&mut self, previous: &Frame, target: &Frame) -> Result<Frame>;

    /// Synthesize the slot `offset` positions after `anchor` in a gap closed by `target`
    ///
    /// `previous` is the filled slot just before. The default cascades from
    /// `previous` and ignores the anchor.
    fn synthesize_in_gap(
        &mut self,
        _anchor: &Frame,
        previous: &Frame,
        target: &Frame,
        _offset: usize,
    ) -> Result<Frame> {
        self.synthesize(previous, target)
    }
}

/// Fill every pending slot of `buffer` with the selected strategy
pub fn synthesize(
    buffer: &mut OutputBuffer,
    strategy: Strategy,
    flow: &FlowConfig,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    info!(
        "Synthesizing {} pending of {} slots with {}",
        buffer.pending_count(),
        buffer.len(),
        strategy
    );

    match strategy {
        Strategy::Duplicate => fill_duplicates(buffer, progress),
        Strategy::Blend => chunk::fill(buffer, &mut Blend, progress),
        Strategy::MotionCompensate(backend) => {
            let mut synth = MotionCompensate::new(backend, flow);
            chunk::fill(buffer, &mut synth, progress)
        }
    }
}
