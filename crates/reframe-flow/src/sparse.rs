//! Point-tracking optical flow (iterative Lucas–Kanade)
//!
//! Every pixel of the anchor frame is seeded as a trial point, each point is
//! tracked into the target frame independently, and the per-point
//! displacements are reshaped into a dense field.

use crate::field::{luma_plane, FlowField};
use crate::warp::sample_plane;
use crate::{check_pair, FlowEstimator};
use ndarray::Array2;
use reframe_core::{FlowConfig, Frame, Result};
use tracing::debug;

/// Tracks lost when the window's structure tensor is this flat (per pixel)
const MIN_EIGENVALUE: f32 = 1e-3;

/// Full-grid point tracker
#[derive(Debug, Clone)]
pub struct SparseEstimator {
    window_radius: usize,
    max_iterations: usize,
    epsilon: f32,
}

impl Default for SparseEstimator {
    fn default() -> Self {
        Self::new(&FlowConfig::default())
    }
}

impl SparseEstimator {
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            window_radius: config.window_radius,
            max_iterations: config.max_iterations,
            epsilon: config.epsilon,
        }
    }

    /// Track `points` from `anchor` into `target`
    ///
    /// Returns the new position of each point, or `None` when the point sits in
    /// a textureless window or leaves the frame.
    pub fn track(
        &self,
        anchor: &Array2<f32>,
        target: &Array2<f32>,
        points: &[(usize, usize)],
    ) -> Vec<Option<(f32, f32)>> {
        let (gx, gy) = central_gradients(anchor);
        points
            .iter()
            .map(|&(x, y)| self.track_point(anchor, target, &gx, &gy, x, y))
            .collect()
    }

    fn track_point(
        &self,
        anchor: &Array2<f32>,
        target: &Array2<f32>,
        gx: &Array2<f32>,
        gy: &Array2<f32>,
        px: usize,
        py: usize,
    ) -> Option<(f32, f32)> {
        let (height, width) = anchor.dim();
        let r = self.window_radius as isize;
        let window: Vec<(usize, usize)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .map(|(dx, dy)| {
                (
                    (px as isize + dx).clamp(0, width as isize - 1) as usize,
                    (py as isize + dy).clamp(0, height as isize - 1) as usize,
                )
            })
            .collect();

        let (mut gxx, mut gxy, mut gyy) = (0.0f32, 0.0f32, 0.0f32);
        for &(x, y) in &window {
            let ix = gx[[y, x]];
            let iy = gy[[y, x]];
            gxx += ix * ix;
            gxy += ix * iy;
            gyy += iy * iy;
        }

        let area = window.len() as f32;
        let trace = (gxx + gyy) / area;
        let det_term = ((gxx - gyy) / area).powi(2) + 4.0 * (gxy / area).powi(2);
        let min_eigen = (trace - det_term.sqrt()) / 2.0;
        let det = gxx * gyy - gxy * gxy;
        if min_eigen < MIN_EIGENVALUE || det.abs() < f32::EPSILON {
            return None;
        }

        let (mut dx, mut dy) = (0.0f32, 0.0f32);
        for _ in 0..self.max_iterations {
            let (mut bx, mut by) = (0.0f32, 0.0f32);
            for &(x, y) in &window {
                let moved = sample_plane(target, x as f32 + dx, y as f32 + dy);
                let error = anchor[[y, x]] - moved;
                bx += gx[[y, x]] * error;
                by += gy[[y, x]] * error;
            }

            let step_x = (gyy * bx - gxy * by) / det;
            let step_y = (gxx * by - gxy * bx) / det;
            dx += step_x;
            dy += step_y;

            if step_x * step_x + step_y * step_y < self.epsilon * self.epsilon {
                break;
            }
        }

        let nx = px as f32 + dx;
        let ny = py as f32 + dy;
        let inside = nx >= -0.5 && ny >= -0.5 && nx <= width as f32 - 0.5 && ny <= height as f32 - 0.5;
        (inside && nx.is_finite() && ny.is_finite()).then_some((nx, ny))
    }
}

impl FlowEstimator for SparseEstimator {
    fn estimate(&self, anchor: &Frame, target: &Frame) -> Result<FlowField> {
        check_pair(anchor, target)?;
        let width = anchor.width() as usize;
        let height = anchor.height() as usize;

        let points: Vec<(usize, usize)> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .collect();
        let tracked = self.track(&luma_plane(anchor)?, &luma_plane(target)?, &points);

        let lost = tracked.iter().filter(|t| t.is_none()).count();
        debug!("Tracked {} of {} points", points.len() - lost, points.len());

        Ok(FlowField::from_tracks(width, height, &points, &tracked))
    }
}

fn central_gradients(plane: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (height, width) = plane.dim();
    let mut gx = Array2::zeros((height, width));
    let mut gy = Array2::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let left = plane[[y, x.saturating_sub(1)]];
            let right = plane[[y, (x + 1).min(width - 1)]];
            let up = plane[[y.saturating_sub(1), x]];
            let down = plane[[(y + 1).min(height - 1), x]];
            gx[[y, x]] = (right - left) / 2.0;
            gy[[y, x]] = (down - up) / 2.0;
        }
    }

    (gx, gy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::blob;
    use reframe_core::Shape;

    #[test]
    fn test_identical_frames_have_zero_flow() {
        let frame = blob(12, 12, 6.0, 6.0);
        let flow = SparseEstimator::default().estimate(&frame, &frame).unwrap();
        assert!(flow.is_static(1e-6));
    }

    #[test]
    fn test_tracks_horizontal_shift() {
        let anchor = blob(24, 24, 11.0, 12.0);
        let target = blob(24, 24, 12.0, 12.0);
        let flow = SparseEstimator::default().estimate(&anchor, &target).unwrap();

        let (u, v) = flow.get(11, 12).unwrap();
        assert!((u - 1.0).abs() < 0.3, "u = {}", u);
        assert!(v.abs() < 0.3, "v = {}", v);
    }

    #[test]
    fn test_flat_window_is_lost() {
        let flat = Frame::filled(Shape::new(6, 6, 1), 90);
        let plane = luma_plane(&flat).unwrap();
        let tracked = SparseEstimator::default().track(&plane, &plane, &[(3, 3)]);
        assert_eq!(tracked, vec![None]);

        let flow = SparseEstimator::default().estimate(&flat, &flat).unwrap();
        assert!(flow.is_static(1e-6));
    }
}
