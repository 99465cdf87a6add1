//! Raw H.264 (Annex-B) streams via OpenH264
//!
//! OpenH264 is Cisco's open-source H.264 codec that automatically downloads
//! prebuilt binaries, making it easy to use without system dependencies.

use crate::ensure_sink_shape;
use openh264::decoder::Decoder;
use openh264::encoder::{Encoder, EncoderConfig};
use openh264::formats::{YUVBuffer, YUVSource};
use openh264::{nal_units, OpenH264API};
use reframe_core::{ColorMode, Error, Frame, FrameSink, FrameSource, Result, SinkConfig, VideoInfo};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Target bitrate in kbps
const BITRATE_KBPS: u32 = 8000;

/// Decodes an Annex-B elementary stream frame by frame
pub struct H264Source {
    decoder: Decoder,
    units: VecDeque<Vec<u8>>,
    first: Option<Frame>,
    info: VideoInfo,
}

impl H264Source {
    /// Open a stream; the frame rate is not carried by the bitstream
    pub fn open(path: &Path, frame_rate: f64) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Decode(format!("{}: {}", path.display(), e)))?;
        let units: VecDeque<Vec<u8>> = nal_units(&data).map(<[u8]>::to_vec).collect();
        if units.is_empty() {
            return Err(Error::Decode(format!(
                "{}: no NAL units found",
                path.display()
            )));
        }

        let decoder = Decoder::new()
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut source = Self {
            decoder,
            units,
            first: None,
            info: VideoInfo {
                width: 0,
                height: 0,
                frame_rate,
                frame_count: None,
            },
        };

        let first = source.decode_next()?.ok_or_else(|| {
            Error::Decode(format!("{}: stream holds no decodable frame", path.display()))
        })?;
        source.info.width = first.width();
        source.info.height = first.height();
        source.first = Some(first);

        info!(
            "H.264 source opened: {}x{} @ {} fps",
            source.info.width, source.info.height, frame_rate
        );
        Ok(source)
    }

    fn decode_next(&mut self) -> Result<Option<Frame>> {
        while let Some(unit) = self.units.pop_front() {
            match self.decoder.decode(&unit) {
                Ok(Some(yuv)) => {
                    let (width, height) = yuv.dimensions();
                    let mut rgb = vec![0u8; width * height * 3];
                    yuv.write_rgb8(&mut rgb);
                    return Frame::new(rgb, width as u32, height as u32, 3).map(Some);
                }
                Ok(None) => continue,
                Err(e) => return Err(Error::Decode(format!("Decoding failed: {}", e))),
            }
        }
        Ok(None)
    }
}

impl FrameSource for H264Source {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(frame) = self.first.take() {
            return Ok(Some(frame));
        }
        self.decode_next()
    }
}

/// Encodes frames into an Annex-B elementary stream file
pub struct H264Sink {
    encoder: Encoder,
    writer: Option<BufWriter<File>>,
    config: SinkConfig,
    frames_written: usize,
    yuv_buffer: Vec<u8>,
}

impl H264Sink {
    /// Create a new H.264 file sink
    pub fn create(config: &SinkConfig) -> Result<Self> {
        if config.width % 2 != 0 || config.height % 2 != 0 {
            return Err(Error::Encoder(format!(
                "H.264 needs even dimensions, got {}x{}",
                config.width, config.height
            )));
        }

        let encoder_config = EncoderConfig::new()
            .max_frame_rate(config.frame_rate as f32)
            .rate_control_mode(openh264::encoder::RateControlMode::Bitrate)
            .set_bitrate_bps(BITRATE_KBPS * 1000)
            .enable_skip_frame(false);

        let api = OpenH264API::from_source();
        let encoder = Encoder::with_api_config(api, encoder_config)
            .map_err(|e| Error::Encoder(format!("Failed to create encoder: {}", e)))?;

        let file = File::create(&config.path)
            .map_err(|e| Error::Encoder(format!("{}: {}", config.path.display(), e)))?;

        // I420: Y + U/4 + V/4
        let yuv_size = (config.width * config.height * 3 / 2) as usize;

        info!(
            "H.264 encoder initialized: {}x{} @ {} fps, {} kbps -> {:?}",
            config.width, config.height, config.frame_rate, BITRATE_KBPS, config.path
        );

        Ok(Self {
            encoder,
            writer: Some(BufWriter::new(file)),
            config: config.clone(),
            frames_written: 0,
            yuv_buffer: vec![0u8; yuv_size],
        })
    }

    /// Convert interleaved samples to YUV420 (I420)
    fn frame_to_yuv420(&mut self, frame: &Frame) {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let channels = frame.channels() as usize;
        let gray = self.config.color == ColorMode::Grayscale;
        let y_size = width * height;
        let uv_size = y_size / 4;
        let data = frame.data();

        let (y_plane, uv_planes) = self.yuv_buffer.split_at_mut(y_size);
        let (u_plane, v_plane) = uv_planes.split_at_mut(uv_size);

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) * channels;
                let (r, g, b) = if channels >= 3 {
                    (data[idx] as i32, data[idx + 1] as i32, data[idx + 2] as i32)
                } else {
                    let v = data[idx] as i32;
                    (v, v, v)
                };

                // BT.601 conversion
                let y_val = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
                y_plane[y * width + x] = y_val.clamp(0, 255) as u8;

                // Subsample U and V (2x2 blocks)
                if y % 2 == 0 && x % 2 == 0 {
                    let uv_idx = (y / 2) * (width / 2) + (x / 2);
                    if gray {
                        u_plane[uv_idx] = 128;
                        v_plane[uv_idx] = 128;
                    } else {
                        let u_val = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                        let v_val = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
                        u_plane[uv_idx] = u_val.clamp(0, 255) as u8;
                        v_plane[uv_idx] = v_val.clamp(0, 255) as u8;
                    }
                }
            }
        }
    }
}

impl FrameSink for H264Sink {
    fn write(&mut self, frame: &Frame) -> Result<()> {
        ensure_sink_shape(&self.config, frame, self.frames_written)?;
        if self.writer.is_none() {
            return Err(Error::Encoder("write after close".into()));
        }

        self.frame_to_yuv420(frame);
        let yuv = YUVBuffer::from_vec(
            self.yuv_buffer.clone(),
            frame.width() as usize,
            frame.height() as usize,
        );

        let bitstream = self
            .encoder
            .encode(&yuv)
            .map_err(|e| Error::Encoder(format!("Encoding failed: {}", e)))?;
        let bytes = bitstream.to_vec();

        debug!("Encoded frame {}: {} bytes", self.frames_written, bytes.len());

        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(&bytes)?;
        }
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!(
                "H.264 stream closed: {} frames -> {:?}",
                self.frames_written, self.config.path
            );
        }
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.frames_written
    }
}
