//! Directories of numbered PNG frames

use crate::{ensure_sink_shape, luma_samples, rgb_samples};
use image::ExtendedColorType;
use reframe_core::{ColorMode, Error, Frame, FrameSink, FrameSource, Result, SinkConfig, VideoInfo};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

/// Reads every `*.png` in a directory in file name order
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    info: VideoInfo,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, frame_rate: f64) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Decode(format!("{}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_png(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let first = paths.first().ok_or_else(|| {
            Error::Decode(format!("{}: no PNG frames found", dir.display()))
        })?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| Error::Decode(format!("{}: {}", first.display(), e)))?;

        info!(
            "PNG sequence opened: {} frames of {}x{} from {:?}",
            paths.len(),
            width,
            height,
            dir
        );

        Ok(Self {
            info: VideoInfo {
                width,
                height,
                frame_rate,
                frame_count: Some(paths.len()),
            },
            paths: paths.into(),
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };

        let image = image::open(&path)
            .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;
        debug!("Decoded {:?} ({:?})", path, image.color());

        let frame = if image.color().has_color() {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Frame::new(rgb.into_raw(), width, height, 3)?
        } else {
            let luma = image.to_luma8();
            let (width, height) = luma.dimensions();
            Frame::new(luma.into_raw(), width, height, 1)?
        };
        Ok(Some(frame))
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory
pub struct ImageSequenceSink {
    config: SinkConfig,
    frames_written: usize,
    closed: bool,
}

impl ImageSequenceSink {
    pub fn create(config: &SinkConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.path)?;
        info!(
            "PNG sequence sink: {}x{} {:?} -> {:?}",
            config.width, config.height, config.color, config.path
        );
        Ok(Self {
            config: config.clone(),
            frames_written: 0,
            closed: false,
        })
    }

    fn frame_path(&self, index: usize) -> PathBuf {
        self.config.path.join(format!("frame_{:06}.png", index))
    }
}

impl FrameSink for ImageSequenceSink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        if self.closed {
            return Err(Error::Encoder("write after close".into()));
        }
        ensure_sink_shape(&self.config, frame, self.frames_written)?;

        let (samples, color) = match self.config.color {
            ColorMode::Color => (rgb_samples(frame), ExtendedColorType::Rgb8),
            ColorMode::Grayscale => (luma_samples(frame), ExtendedColorType::L8),
        };

        let path = self.frame_path(self.frames_written);
        image::save_buffer(&path, &samples, frame.width(), frame.height(), color)
            .map_err(|e| Error::Encoder(format!("{}: {}", path.display(), e)))?;

        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            info!(
                "PNG sequence closed: {} frames in {:?}",
                self.frames_written, self.config.path
            );
        }
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.frames_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::{FourCc, Shape};
    use tempfile::tempdir;

    fn config(path: &Path, color: ColorMode) -> SinkConfig {
        SinkConfig {
            path: path.to_path_buf(),
            frame_rate: 24.0,
            width: 4,
            height: 3,
            color,
            codec: FourCc::PNG,
        }
    }

    fn gradient(offset: u8) -> Frame {
        let data = (0..4 * 3 * 3).map(|i| offset.wrapping_add(i as u8 * 7)).collect();
        Frame::new(data, 4, 3, 3).unwrap()
    }

    #[test]
    fn test_written_frames_read_back_losslessly() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("frames");

        let frames = [gradient(0), gradient(90), gradient(180)];
        let mut sink = ImageSequenceSink::create(&config(&out, ColorMode::Color)).unwrap();
        for frame in &frames {
            sink.write(frame).unwrap();
        }
        sink.close().unwrap();
        assert!(out.join("frame_000002.png").exists());

        let mut source = ImageSequenceSource::open(&out, 24.0).unwrap();
        assert_eq!(source.info().frame_count, Some(3));
        assert_eq!((source.info().width, source.info().height), (4, 3));

        for expected in &frames {
            assert_eq!(&source.next_frame().unwrap().unwrap(), expected);
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_grayscale_sink_writes_single_channel() {
        let dir = tempdir().unwrap();
        let mut sink = ImageSequenceSink::create(&config(dir.path(), ColorMode::Grayscale)).unwrap();
        sink.write(&Frame::filled(Shape::new(4, 3, 3), 77)).unwrap();
        sink.close().unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 24.0).unwrap();
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.shape(), Shape::new(4, 3, 1));
        assert!(frame.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn test_empty_directory_is_a_decode_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();
        assert!(matches!(
            ImageSequenceSource::open(dir.path(), 30.0),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_corrupt_frame_is_an_error_not_end_of_stream() {
        let dir = tempdir().unwrap();
        let mut sink = ImageSequenceSink::create(&config(dir.path(), ColorMode::Color)).unwrap();
        sink.write(&gradient(0)).unwrap();
        std::fs::write(dir.path().join("frame_000001.png"), b"garbage").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 30.0).unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(matches!(source.next_frame(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = ImageSequenceSink::create(&config(dir.path(), ColorMode::Color)).unwrap();
        sink.close().unwrap();
        assert!(matches!(sink.write(&gradient(0)), Err(Error::Encoder(_))));
    }
}
