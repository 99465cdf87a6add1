//! reframe Core - Shared types and collaborator interfaces
//!
//! This crate provides the foundational types used across all reframe components.

pub mod config;
pub mod error;
pub mod frame;
pub mod progress;
pub mod video;

pub use config::{validate_fps, ColorMode, Config, FlowBackend, FlowConfig, FourCc, Strategy};
pub use error::{Error, Result};
pub use frame::{Frame, FrameSequence, Shape};
pub use progress::{normalize, NoProgress, ProgressSink, TracingProgress};
pub use video::{FrameSink, FrameSource, SinkConfig, VideoInfo};
