//! reframe IO - Frame sources and sinks
//!
//! This crate provides decoding and encoding for:
//! - Directories of PNG frames (lossless, any size)
//! - Raw H.264 Annex-B streams via OpenH264

pub mod h264;
pub mod image_sequence;

pub use h264::{H264Sink, H264Source};
pub use image_sequence::{ImageSequenceSink, ImageSequenceSource};

use reframe_core::{
    Error, FourCc, Frame, FrameSink, FrameSource, Result, Shape, SinkConfig, VideoInfo,
};
use std::path::Path;

/// Codec tags routed to the H.264 encoder
const H264_TAGS: [FourCc; 3] = [FourCc::H264, FourCc(*b"AVC1"), FourCc(*b"X264")];

fn has_h264_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("h264") || ext.eq_ignore_ascii_case("264"))
}

/// Default codec tag for an output path
pub fn codec_for_path(path: &Path) -> FourCc {
    if has_h264_extension(path) {
        FourCc::H264
    } else {
        FourCc::PNG
    }
}

/// Unified frame source over every supported input kind
pub enum VideoSource {
    ImageSequence(ImageSequenceSource),
    H264(H264Source),
}

impl VideoSource {
    /// Open `path`, choosing the decoder from what the path looks like
    ///
    /// `frame_rate` is reported as the source rate, since neither a PNG
    /// directory nor a raw elementary stream records one.
    pub fn open(path: &Path, frame_rate: f64) -> Result<Self> {
        if path.is_dir() {
            tracing::info!("Reading PNG sequence from {:?}", path);
            Ok(Self::ImageSequence(ImageSequenceSource::open(path, frame_rate)?))
        } else if has_h264_extension(path) {
            tracing::info!("Reading H.264 stream from {:?}", path);
            Ok(Self::H264(H264Source::open(path, frame_rate)?))
        } else if !path.exists() {
            Err(Error::Decode(format!("{}: no such file or directory", path.display())))
        } else {
            Err(Error::Decode(format!(
                "{}: unsupported input, expected a PNG directory or .h264 stream",
                path.display()
            )))
        }
    }
}

impl FrameSource for VideoSource {
    fn info(&self) -> &VideoInfo {
        match self {
            Self::ImageSequence(src) => src.info(),
            Self::H264(src) => src.info(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            Self::ImageSequence(src) => src.next_frame(),
            Self::H264(src) => src.next_frame(),
        }
    }
}

/// Unified frame sink selected by codec tag
pub enum VideoSink {
    ImageSequence(ImageSequenceSink),
    H264(H264Sink),
}

impl VideoSink {
    /// Open the encoder registered for `config.codec`
    pub fn open(config: &SinkConfig) -> Result<Self> {
        if H264_TAGS.contains(&config.codec) {
            Ok(Self::H264(H264Sink::create(config)?))
        } else if config.codec == FourCc::PNG {
            Ok(Self::ImageSequence(ImageSequenceSink::create(config)?))
        } else {
            Err(Error::UnsupportedCodec(config.codec))
        }
    }
}

impl FrameSink for VideoSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        match self {
            Self::ImageSequence(sink) => sink.write(frame),
            Self::H264(sink) => sink.write(frame),
        }
    }

    fn close(&mut self) -> Result<()> {
        match self {
            Self::ImageSequence(sink) => sink.close(),
            Self::H264(sink) => sink.close(),
        }
    }

    fn frames_written(&self) -> usize {
        match self {
            Self::ImageSequence(sink) => sink.frames_written(),
            Self::H264(sink) => sink.frames_written(),
        }
    }
}

/// Open an input for reading, see [`VideoSource::open`]
pub fn open_source(path: &Path, frame_rate: f64) -> Result<VideoSource> {
    VideoSource::open(path, frame_rate)
}

/// Boxed form of [`VideoSink::open`] for the conversion pipeline
pub fn open_sink(config: &SinkConfig) -> Result<Box<dyn FrameSink>> {
    Ok(Box::new(VideoSink::open(config)?))
}

/// Frames must match the size the sink was opened with
pub(crate) fn ensure_sink_shape(config: &SinkConfig, frame: &Frame, index: usize) -> Result<()> {
    if frame.width() != config.width || frame.height() != config.height {
        let expected = Shape::new(config.width, config.height, frame.channels());
        return Err(Error::mismatch(index, expected, frame.shape()));
    }
    Ok(())
}

/// Interleaved RGB, replicating gray and dropping alpha
pub(crate) fn rgb_samples(frame: &Frame) -> Vec<u8> {
    match frame.channels() {
        3 => frame.data().to_vec(),
        1 => frame.data().iter().flat_map(|&v| [v, v, v]).collect(),
        2 => frame.data().chunks_exact(2).flat_map(|px| [px[0]; 3]).collect(),
        _ => frame
            .data()
            .chunks_exact(frame.channels() as usize)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
    }
}

/// 8-bit luminance, one sample per pixel
pub(crate) fn luma_samples(frame: &Frame) -> Vec<u8> {
    if frame.channels() == 1 {
        return frame.data().to_vec();
    }
    frame
        .luminance()
        .into_iter()
        .map(|l| l.round().clamp(0.0, 255.0) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::ColorMode;
    use tempfile::tempdir;

    fn sink_config(path: &Path, codec: FourCc) -> SinkConfig {
        SinkConfig {
            path: path.to_path_buf(),
            frame_rate: 60.0,
            width: 8,
            height: 8,
            color: ColorMode::Color,
            codec,
        }
    }

    #[test]
    fn test_codec_for_path() {
        assert_eq!(codec_for_path(Path::new("out.h264")), FourCc::H264);
        assert_eq!(codec_for_path(Path::new("OUT.264")), FourCc::H264);
        assert_eq!(codec_for_path(Path::new("frames")), FourCc::PNG);
    }

    #[test]
    fn test_unsupported_codec() {
        let dir = tempdir().unwrap();
        let tag: FourCc = "divx".parse().unwrap();
        let result = VideoSink::open(&sink_config(&dir.path().join("out.avi"), tag));
        assert!(matches!(result, Err(Error::UnsupportedCodec(t)) if t == tag));
    }

    #[test]
    fn test_sink_dispatch() {
        let dir = tempdir().unwrap();
        let png = VideoSink::open(&sink_config(&dir.path().join("frames"), FourCc::PNG)).unwrap();
        assert!(matches!(png, VideoSink::ImageSequence(_)));

        let avc1: FourCc = "avc1".parse().unwrap();
        let h264 = VideoSink::open(&sink_config(&dir.path().join("out.h264"), avc1)).unwrap();
        assert!(matches!(h264, VideoSink::H264(_)));
    }

    #[test]
    fn test_open_source_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            open_source(&dir.path().join("missing.mp4"), 30.0),
            Err(Error::Decode(_))
        ));

        let text = dir.path().join("clip.txt");
        std::fs::write(&text, "hello").unwrap();
        assert!(matches!(VideoSource::open(&text, 30.0), Err(Error::Decode(_))));
    }

    #[test]
    fn test_sample_conversion() {
        let gray = Frame::new(vec![10, 20], 2, 1, 1).unwrap();
        assert_eq!(rgb_samples(&gray), vec![10, 10, 10, 20, 20, 20]);

        let rgba = Frame::new(vec![1, 2, 3, 255, 4, 5, 6, 255], 2, 1, 4).unwrap();
        assert_eq!(rgb_samples(&rgba), vec![1, 2, 3, 4, 5, 6]);

        let white = Frame::filled(Shape::new(2, 2, 3), 255);
        assert_eq!(luma_samples(&white), vec![255; 4]);
    }
}
