//! Dense optical flow (Horn–Schunck)
//!
//! Solves the brightness constancy constraint `Ix·u + Iy·v + It = 0` with a
//! global smoothness term, relaxing every pixel's vector towards the weighted
//! average of its neighbours.

use crate::field::{luma_plane, FlowField};
use crate::{check_pair, FlowEstimator};
use ndarray::Array2;
use reframe_core::{FlowConfig, Frame, Result};
use tracing::debug;

/// Dense per-pixel estimator working on luminance planes
#[derive(Debug, Clone)]
pub struct DenseEstimator {
    smoothness: f32,
    iterations: usize,
}

impl Default for DenseEstimator {
    fn default() -> Self {
        Self::new(&FlowConfig::default())
    }
}

impl DenseEstimator {
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            smoothness: config.smoothness,
            iterations: config.iterations,
        }
    }

    /// Flow between two luminance planes of equal shape
    pub fn estimate_planes(&self, anchor: &Array2<f32>, target: &Array2<f32>) -> FlowField {
        let (height, width) = anchor.dim();
        let (ix, iy, it) = derivatives(anchor, target);
        let alpha2 = self.smoothness * self.smoothness;

        let mut u = Array2::<f32>::zeros((height, width));
        let mut v = Array2::<f32>::zeros((height, width));

        for _ in 0..self.iterations {
            let u_avg = neighbour_average(&u);
            let v_avg = neighbour_average(&v);

            for y in 0..height {
                for x in 0..width {
                    let gx = ix[[y, x]];
                    let gy = iy[[y, x]];
                    let ub = u_avg[[y, x]];
                    let vb = v_avg[[y, x]];
                    let residual = (gx * ub + gy * vb + it[[y, x]]) / (alpha2 + gx * gx + gy * gy);
                    u[[y, x]] = ub - gx * residual;
                    v[[y, x]] = vb - gy * residual;
                }
            }
        }

        FlowField { u, v }
    }
}

impl FlowEstimator for DenseEstimator {
    fn estimate(&self, anchor: &Frame, target: &Frame) -> Result<FlowField> {
        check_pair(anchor, target)?;
        let flow = self.estimate_planes(&luma_plane(anchor)?, &luma_plane(target)?);
        debug!(
            "Dense flow {}x{}: max magnitude {:.3}",
            flow.width(),
            flow.height(),
            flow.max_magnitude()
        );
        Ok(flow)
    }
}

fn at(plane: &Array2<f32>, y: isize, x: isize) -> f32 {
    let (height, width) = plane.dim();
    let y = y.clamp(0, height as isize - 1) as usize;
    let x = x.clamp(0, width as isize - 1) as usize;
    plane[[y, x]]
}

/// Spatial and temporal derivatives averaged over the 2x2x2 cube at each pixel
fn derivatives(
    first: &Array2<f32>,
    second: &Array2<f32>,
) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let (height, width) = first.dim();
    let mut ix = Array2::zeros((height, width));
    let mut iy = Array2::zeros((height, width));
    let mut it = Array2::zeros((height, width));

    for y in 0..height as isize {
        for x in 0..width as isize {
            let mut gx = 0.0;
            let mut gy = 0.0;
            let mut gt = 0.0;
            for plane in [first, second] {
                gx += at(plane, y, x + 1) - at(plane, y, x) + at(plane, y + 1, x + 1)
                    - at(plane, y + 1, x);
                gy += at(plane, y + 1, x) - at(plane, y, x) + at(plane, y + 1, x + 1)
                    - at(plane, y, x + 1);
            }
            for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                gt += at(second, y + dy, x + dx) - at(first, y + dy, x + dx);
            }
            let idx = [y as usize, x as usize];
            ix[idx] = gx / 4.0;
            iy[idx] = gy / 4.0;
            it[idx] = gt / 4.0;
        }
    }

    (ix, iy, it)
}

/// Weighted 8-neighbour average: edges 1/6, corners 1/12
fn neighbour_average(field: &Array2<f32>) -> Array2<f32> {
    let (height, width) = field.dim();
    let mut out = Array2::zeros((height, width));

    for y in 0..height as isize {
        for x in 0..width as isize {
            let edges = at(field, y - 1, x) + at(field, y + 1, x) + at(field, y, x - 1)
                + at(field, y, x + 1);
            let corners = at(field, y - 1, x - 1)
                + at(field, y - 1, x + 1)
                + at(field, y + 1, x - 1)
                + at(field, y + 1, x + 1);
            out[[y as usize, x as usize]] = edges / 6.0 + corners / 12.0;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::blob;

    #[test]
    fn test_identical_frames_have_zero_flow() {
        let frame = blob(16, 16, 7.0, 8.0);
        let flow = DenseEstimator::default().estimate(&frame, &frame).unwrap();
        assert!(flow.is_static(1e-6));
    }

    #[test]
    fn test_horizontal_shift_points_right() {
        let anchor = blob(20, 20, 9.0, 10.0);
        let target = blob(20, 20, 10.0, 10.0);
        let flow = DenseEstimator::default().estimate(&anchor, &target).unwrap();

        let mut u_sum = 0.0;
        let mut v_abs = 0.0;
        for y in 6..14 {
            for x in 6..14 {
                let (u, v) = flow.get(x, y).unwrap();
                u_sum += u;
                v_abs += v.abs();
            }
        }
        assert!(u_sum > 0.0, "expected rightward motion, got {}", u_sum);
        assert!(u_sum > v_abs, "horizontal {} vs vertical {}", u_sum, v_abs);
    }

    #[test]
    fn test_rejects_mismatched_frames() {
        let result = DenseEstimator::default().estimate(&blob(8, 8, 4.0, 4.0), &blob(8, 6, 4.0, 3.0));
        assert!(result.is_err());
    }
}
