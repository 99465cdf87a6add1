//! Decode and encode collaborator interfaces

use crate::config::{ColorMode, FourCc};
use crate::error::Result;
use crate::frame::Frame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Properties reported by a source when it is opened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Frame count when the container knows it up front
    pub frame_count: Option<usize>,
}

/// A finite, non-restartable stream of decoded frames
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;

    /// Next frame, `Ok(None)` once the stream is exhausted
    ///
    /// Read failures are returned as errors and never look like exhaustion.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Settings an encoder sink is opened with
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub path: PathBuf,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
    pub color: ColorMode,
    pub codec: FourCc,
}

/// Sequential frame writer
pub trait FrameSink {
    fn write(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and release the output; no writes may follow
    fn close(&mut self) -> Result<()>;

    /// Frames written so far
    fn frames_written(&self) -> usize;
}
