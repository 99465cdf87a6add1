//! Dense displacement fields

use ndarray::{Array2, Zip};
use reframe_core::{Error, Frame, Result};

/// Per-pixel displacement from an anchor frame towards a target frame
///
/// Both components are stored `[height, width]`. Positive `u` is motion to
/// the right, positive `v` is motion downward.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    pub u: Array2<f32>,
    pub v: Array2<f32>,
}

/// Absolute source coordinates for backward sampling, `[height, width]`
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingMap {
    pub x: Array2<f32>,
    pub y: Array2<f32>,
}

impl FlowField {
    /// Zero motion field
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            u: Array2::zeros((height, width)),
            v: Array2::zeros((height, width)),
        }
    }

    pub fn from_components(u: Array2<f32>, v: Array2<f32>) -> Result<Self> {
        if u.dim() != v.dim() {
            return Err(Error::InvalidFrame(format!(
                "flow components differ in shape: {:?} vs {:?}",
                u.dim(),
                v.dim()
            )));
        }
        Ok(Self { u, v })
    }

    /// Rebuild a dense field from tracked points
    ///
    /// `points[i]` moved to `tracked[i]`; untracked points keep zero motion.
    pub fn from_tracks(
        width: usize,
        height: usize,
        points: &[(usize, usize)],
        tracked: &[Option<(f32, f32)>],
    ) -> Self {
        let mut field = Self::zeros(width, height);
        for (&(x, y), next) in points.iter().zip(tracked) {
            if let Some((nx, ny)) = next {
                field.set(x, y, nx - x as f32, ny - y as f32);
            }
        }
        field
    }

    pub fn width(&self) -> usize {
        self.u.ncols()
    }

    pub fn height(&self) -> usize {
        self.u.nrows()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        Some((*self.u.get((y, x))?, *self.v.get((y, x))?))
    }

    pub fn set(&mut self, x: usize, y: usize, u: f32, v: f32) {
        if y < self.height() && x < self.width() {
            self.u[[y, x]] = u;
            self.v[[y, x]] = v;
        }
    }

    /// Largest vector length in the field
    pub fn max_magnitude(&self) -> f32 {
        let mut max = 0.0f32;
        Zip::from(&self.u).and(&self.v).for_each(|&u, &v| {
            max = max.max((u * u + v * v).sqrt());
        });
        max
    }

    pub fn mean_motion(&self) -> (f32, f32) {
        let count = self.u.len().max(1) as f32;
        (self.u.sum() / count, self.v.sum() / count)
    }

    pub fn is_static(&self, threshold: f32) -> bool {
        self.max_magnitude() < threshold
    }

    /// Whether the field covers exactly this frame's pixel grid
    pub fn matches(&self, frame: &Frame) -> bool {
        self.width() == frame.width() as usize && self.height() == frame.height() as usize
    }

    /// Negate the scaled field and bias it by the pixel grid
    ///
    /// Output pixel (x, y) samples the anchor at
    /// `(x - scale * u(x, y), y - scale * v(x, y))`.
    pub fn sampling_map(&self, scale: f32) -> SamplingMap {
        let mut x = Array2::<f32>::zeros(self.u.dim());
        let mut y = Array2::<f32>::zeros(self.v.dim());

        Zip::indexed(&mut x)
            .and(&mut y)
            .and(&self.u)
            .and(&self.v)
            .for_each(|(row, col), mx, my, &u, &v| {
                *mx = col as f32 - scale * u;
                *my = row as f32 - scale * v;
            });

        SamplingMap { x, y }
    }
}

/// Luminance plane of a frame as a `[height, width]` array
pub fn luma_plane(frame: &Frame) -> Result<Array2<f32>> {
    Array2::from_shape_vec(
        (frame.height() as usize, frame.width() as usize),
        frame.luminance(),
    )
    .map_err(|e| Error::InvalidFrame(format!("luminance plane: {}", e)))
}
