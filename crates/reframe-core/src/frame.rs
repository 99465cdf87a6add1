//! Frame representation for decoded video data
//!
//! This module provides the common Frame type shared by the resampler, the
//! synthesis strategies, the flow estimators and the video collaborators.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Width, height and channel count of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl Shape {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Number of pixels in one plane
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of samples (bytes) a frame of this shape holds
    pub fn sample_count(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// A single decoded frame
///
/// Samples are stored interleaved, row-major, one byte per channel. The buffer
/// is reference counted so duplicated frames share storage.
#[derive(Clone)]
pub struct Frame {
    data: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    /// Create a new frame from interleaved sample data
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Result<Self> {
        let shape = Shape::new(width, height, channels);
        if width == 0 || height == 0 || channels == 0 {
            return Err(Error::InvalidFrame(format!("empty frame shape {}", shape)));
        }
        if data.len() != shape.sample_count() {
            return Err(Error::InvalidFrame(format!(
                "{} bytes for shape {} (expected {})",
                data.len(),
                shape,
                shape.sample_count()
            )));
        }

        Ok(Self {
            data: Arc::new(data),
            width,
            height,
            channels,
        })
    }

    /// Create a frame where every sample has the same value
    pub fn filled(shape: Shape, value: u8) -> Self {
        Self {
            data: Arc::new(vec![value; shape.sample_count()]),
            width: shape.width,
            height: shape.height,
            channels: shape.channels,
        }
    }

    /// All-zero frame of the given shape
    pub fn black(shape: Shape) -> Self {
        Self::filled(shape, 0)
    }

    /// All-zero frame with the same shape as this one
    pub fn black_like(&self) -> Self {
        Self::black(self.shape())
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.width, self.height, self.channels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved channels per pixel (1 = gray, 3 = RGB, 4 = RGBA)
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Get the raw sample data as a slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the number of bytes per row (stride)
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Get total size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Samples of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.channels as usize;
        let start = y as usize * self.stride() + x as usize * channels;
        &self.data[start..start + channels]
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.shape() == other.shape()
    }

    /// Check this frame against the shape expected at sequence position `index`
    pub fn ensure_shape(&self, expected: Shape, index: usize) -> Result<()> {
        if self.shape() != expected {
            return Err(Error::mismatch(index, expected, self.shape()));
        }
        Ok(())
    }

    /// Whether both frames share the same sample buffer
    pub fn shares_buffer(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Elementwise arithmetic mean of two frames
    ///
    /// The fractional half is truncated, so `mean(30, 0) == 15` and
    /// `mean(10, 21) == 15`. A shape mismatch names `other` as position 1 of
    /// the pair; callers that know the output slot rebind it with
    /// [`Error::at_index`].
    pub fn mean(&self, other: &Frame) -> Result<Frame> {
        other.ensure_shape(self.shape(), 1)?;

        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| ((a as u16 + b as u16) / 2) as u8)
            .collect();

        Ok(Self {
            data: Arc::new(data),
            width: self.width,
            height: self.height,
            channels: self.channels,
        })
    }

    /// Single-channel luminance plane in the sample range [0, 255]
    ///
    /// Three and four channel frames are treated as RGB(A) and reduced with
    /// BT.601 weights; any other layout averages its channels.
    pub fn luminance(&self) -> Vec<f32> {
        let channels = self.channels as usize;
        self.data
            .chunks_exact(channels)
            .map(|px| match channels {
                1 => px[0] as f32,
                3 | 4 => 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32,
                _ => px.iter().map(|&s| s as f32).sum::<f32>() / channels as f32,
            })
            .collect()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(other) && (self.shares_buffer(other) || self.data == other.data)
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Ordered frames that all share one shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence, failing on the first frame whose shape differs from frame 0
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self> {
        if let Some(first) = frames.first() {
            let expected = first.shape();
            for (index, frame) in frames.iter().enumerate() {
                frame.ensure_shape(expected, index)?;
            }
        }
        Ok(Self { frames })
    }

    /// Append a frame, checking it against the sequence shape
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        if let Some(expected) = self.shape() {
            frame.ensure_shape(expected, self.frames.len())?;
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Shape shared by every frame, `None` while empty
    pub fn shape(&self) -> Option<Shape> {
        self.frames.first().map(Frame::shape)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(value: u8) -> Frame {
        Frame::filled(Shape::new(1, 1, 1), value)
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = Frame::new(vec![0; 5], 2, 2, 1);
        assert!(matches!(result, Err(Error::InvalidFrame(_))));

        let result = Frame::new(vec![], 0, 2, 1);
        assert!(matches!(result, Err(Error::InvalidFrame(_))));
    }

    #[test]
    fn test_mean_truncates() {
        assert_eq!(gray(10).mean(&gray(20)).unwrap(), gray(15));
        assert_eq!(gray(10).mean(&gray(21)).unwrap(), gray(15));
        assert_eq!(gray(30).mean(&gray(0)).unwrap(), gray(15));
        assert_eq!(gray(255).mean(&gray(255)).unwrap(), gray(255));
    }

    #[test]
    fn test_mean_rejects_shape_mismatch() {
        let rgb = Frame::filled(Shape::new(1, 1, 3), 9);
        let result = gray(1).mean(&rgb);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_luminance() {
        let white = Frame::filled(Shape::new(2, 1, 3), 255);
        for value in white.luminance() {
            assert!((value - 255.0).abs() < 0.01);
        }

        let red = Frame::new(vec![255, 0, 0], 1, 1, 3).unwrap();
        assert!((red.luminance()[0] - 76.245).abs() < 0.01);

        assert_eq!(gray(42).luminance(), vec![42.0]);
    }

    #[test]
    fn test_pixel_access() {
        let frame = Frame::new((0..12).collect(), 2, 2, 3).unwrap();
        assert_eq!(frame.pixel(1, 0), &[3, 4, 5]);
        assert_eq!(frame.pixel(0, 1), &[6, 7, 8]);
    }

    #[test]
    fn test_sequence_rejects_mixed_shapes() {
        let frames = vec![gray(1), gray(2), Frame::filled(Shape::new(2, 1, 1), 3)];
        match FrameSequence::from_frames(frames) {
            Err(Error::DimensionMismatch { index, expected, found }) => {
                assert_eq!(index, 2);
                assert_eq!(expected, Shape::new(1, 1, 1));
                assert_eq!(found, Shape::new(2, 1, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let mut sequence = FrameSequence::new();
        sequence.push(gray(1)).unwrap();
        assert!(sequence.push(Frame::filled(Shape::new(1, 1, 3), 0)).is_err());
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let frame = gray(7);
        let copy = frame.clone();
        assert!(frame.shares_buffer(&copy));
        assert!(!frame.shares_buffer(&gray(7)));
        assert_eq!(frame, gray(7));
    }

    #[test]
    fn test_dimension_accessors() {
        let frame = Frame::new(vec![0; 4 * 3 * 3], 4, 3, 3).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (4, 3, 3));
        assert_eq!(frame.shape(), Shape::new(4, 3, 3));
    }
}
