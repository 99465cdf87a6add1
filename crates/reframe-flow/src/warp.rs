//! Backward warping with bilinear sampling
//!
//! Each output pixel is sampled from a displaced location in the source frame,
//! so the result has no holes. Coordinates outside the frame replicate the
//! nearest edge pixel.

use crate::field::{FlowField, SamplingMap};
use ndarray::Array2;
use reframe_core::{Error, Frame, Result, Shape};

/// Warp `frame` along `scale` times the flow field
pub fn warp(frame: &Frame, flow: &FlowField, scale: f32) -> Result<Frame> {
    if !flow.matches(frame) {
        return Err(Error::mismatch(
            0,
            frame.shape(),
            Shape::new(flow.width() as u32, flow.height() as u32, frame.channels()),
        ));
    }
    remap(frame, &flow.sampling_map(scale))
}

/// Resample every channel of `frame` at the absolute coordinates in `map`
pub fn remap(frame: &Frame, map: &SamplingMap) -> Result<Frame> {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels() as usize;

    if map.x.dim() != (height, width) || map.y.dim() != (height, width) {
        return Err(Error::InvalidFrame(format!(
            "sampling map {:?} does not cover a {}x{} frame",
            map.x.dim(),
            width,
            height
        )));
    }

    let data = frame.data();
    let stride = frame.stride();
    let mut out = Vec::with_capacity(data.len());

    for y in 0..height {
        for x in 0..width {
            let sx = map.x[[y, x]];
            let sy = map.y[[y, x]];
            for c in 0..channels {
                let value = bilinear(width, height, sx, sy, |px, py| {
                    data[py * stride + px * channels + c] as f32
                });
                out.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }

    Frame::new(out, frame.width(), frame.height(), frame.channels())
}

/// Sample a `[height, width]` plane at a fractional position
pub fn sample_plane(plane: &Array2<f32>, x: f32, y: f32) -> f32 {
    let (height, width) = plane.dim();
    bilinear(width, height, x, y, |px, py| plane[[py, px]])
}

/// Bilinear interpolation over a replicate-bordered grid
///
///   f(x, y) = f00(1-dx)(1-dy) + f10 dx(1-dy) + f01(1-dx)dy + f11 dx dy
fn bilinear(
    width: usize,
    height: usize,
    x: f32,
    y: f32,
    fetch: impl Fn(usize, usize) -> f32,
) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let clamp_x = |v: f32| (v.max(0.0) as usize).min(width - 1);
    let clamp_y = |v: f32| (v.max(0.0) as usize).min(height - 1);

    let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

    let v00 = fetch(xa, ya);
    let v10 = fetch(xb, ya);
    let v01 = fetch(xa, yb);
    let v11 = fetch(xb, yb);

    v00 * (1.0 - fx) * (1.0 - fy) + v10 * fx * (1.0 - fy) + v01 * (1.0 - fx) * fy + v11 * fx * fy
}
