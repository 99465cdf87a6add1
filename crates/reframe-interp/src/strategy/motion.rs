//! Motion-compensated interpolation

use super::FrameSynthesizer;
use reframe_core::{FlowBackend, FlowConfig, Frame, Result};
use reframe_flow::{estimator, warp, FlowEstimator, FlowField};
use tracing::debug;

/// Warps a gap's opening anchor along the flow estimated towards its closing frame
///
/// Slot `k` after the anchor is warped by `1 - (1 - s)^k` of the flow, where
/// `s` is the temporal scale. The flow of the current gap is estimated once
/// and reused for every slot in it.
pub struct MotionCompensate {
    backend: Option<FlowBackend>,
    estimator: Box<dyn FlowEstimator>,
    temporal_scale: f32,
    cached: Option<(Frame, Frame, FlowField)>,
}

impl MotionCompensate {
    pub fn new(backend: FlowBackend, config: &FlowConfig) -> Self {
        Self {
            backend: Some(backend),
            estimator: estimator(backend, config),
            temporal_scale: config.temporal_scale,
            cached: None,
        }
    }

    /// Use a custom estimator
    pub fn with_estimator(estimator: Box<dyn FlowEstimator>, temporal_scale: f32) -> Self {
        Self {
            backend: None,
            estimator,
            temporal_scale,
            cached: None,
        }
    }

    /// Built-in backend, `None` for a custom estimator
    pub fn backend(&self) -> Option<FlowBackend> {
        self.backend
    }

    /// Fraction of the flow applied `offset` slots after the anchor
    fn scale_at(&self, offset: usize) -> f32 {
        1.0 - (1.0 - self.temporal_scale).powi(offset as i32)
    }

    fn warp_towards(&mut self, anchor: &Frame, target: &Frame, scale: f32) -> Result<Frame> {
        let flow = match self.cached.take() {
            Some((a, t, flow)) if a.shares_buffer(anchor) && t.shares_buffer(target) => flow,
            _ => {
                let flow = self.estimator.estimate(anchor, target)?;
                debug!(
                    "Flow {}: mean {:?}, max {:.3}",
                    self.name(),
                    flow.mean_motion(),
                    flow.max_magnitude()
                );
                flow
            }
        };
        let frame = warp(anchor, &flow, scale);
        self.cached = Some((anchor.clone(), target.clone(), flow));
        frame
    }
}

impl FrameSynthesizer for MotionCompensate {
    fn name(&self) -> &'static str {
        match self.backend {
            Some(FlowBackend::Dense) => "mci-dense",
            Some(FlowBackend::Sparse) => "mci-sparse",
            None => "mci-custom",
        }
    }

    fn synthesize(&mut self, previous: &Frame, target: &Frame) -> Result<Frame> {
        self.warp_towards(previous, target, self.temporal_scale)
    }

    fn synthesize_in_gap(
        &mut self,
        anchor: &Frame,
        _previous: &Frame,
        target: &Frame,
        offset: usize,
    ) -> Result<Frame> {
        let scale = self.scale_at(offset);
        self.warp_towards(anchor, target, scale)
    }
}
