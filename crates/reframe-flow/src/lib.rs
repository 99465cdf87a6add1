//! reframe Flow - Optical flow estimation and frame warping
//!
//! Two interchangeable estimators produce a [`FlowField`] between an anchor
//! frame and a target frame:
//!
//! - [`DenseEstimator`]: Horn–Schunck flow computed directly between luminance planes
//! - [`SparseEstimator`]: Lucas–Kanade tracking of one point per pixel, reshaped to a dense field
//!
//! [`warp`] turns a field into a backward sampling map and resamples the anchor
//! with bilinear interpolation.

pub mod dense;
pub mod field;
pub mod sparse;
pub mod warp;

pub use dense::DenseEstimator;
pub use field::{luma_plane, FlowField, SamplingMap};
pub use sparse::SparseEstimator;
pub use warp::{remap, warp};

use reframe_core::{FlowBackend, FlowConfig, Frame, Result};

/// Produces a per-pixel displacement field from `anchor` towards `target`
pub trait FlowEstimator {
    fn estimate(&self, anchor: &Frame, target: &Frame) -> Result<FlowField>;
}

/// Build the estimator for a backend
pub fn estimator(backend: FlowBackend, config: &FlowConfig) -> Box<dyn FlowEstimator> {
    match backend {
        FlowBackend::Dense => Box::new(DenseEstimator::new(config)),
        FlowBackend::Sparse => Box::new(SparseEstimator::new(config)),
    }
}

/// Estimate flow with a backend's default tuning
pub fn estimate(anchor: &Frame, target: &Frame, backend: FlowBackend) -> Result<FlowField> {
    estimator(backend, &FlowConfig::default()).estimate(anchor, target)
}

/// Both frames of a flow pair must share a shape
pub(crate) fn check_pair(anchor: &Frame, target: &Frame) -> Result<()> {
    target.ensure_shape(anchor.shape(), 1)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use reframe_core::{Error, Shape};

    /// Single-channel Gaussian blob centred at (cx, cy)
    pub fn blob(width: u32, height: u32, cx: f32, cy: f32) -> Frame {
        let sigma2 = 2.0 * 3.0f32 * 3.0;
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x as f32, y as f32)))
            .map(|(x, y)| {
                let d2 = (x - cx).powi(2) + (y - cy).powi(2);
                (20.0 + 200.0 * (-d2 / sigma2).exp()).round() as u8
            })
            .collect();
        Frame::new(data, width, height, 1).unwrap()
    }

    #[test]
    fn test_zero_motion_round_trip_both_backends() {
        let data: Vec<u8> = (0..10 * 8 * 3).map(|v| (v * 7 % 256) as u8).collect();
        let frame = Frame::new(data, 10, 8, 3).unwrap();

        for backend in [FlowBackend::Dense, FlowBackend::Sparse] {
            let flow = estimate(&frame, &frame, backend).unwrap();
            let warped = warp(&frame, &flow, 0.5).unwrap();
            assert_eq!(warped, frame, "{:?} backend moved a static frame", backend);
        }
    }

    #[test]
    fn test_estimate_rejects_shape_mismatch() {
        let a = Frame::black(Shape::new(4, 4, 3));
        let b = Frame::black(Shape::new(4, 4, 1));
        for backend in [FlowBackend::Dense, FlowBackend::Sparse] {
            let result = estimate(&a, &b, backend);
            assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        }
    }
}
