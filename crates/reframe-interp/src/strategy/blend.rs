//! Linear blending

use super::FrameSynthesizer;
use reframe_core::{Frame, Result};

/// Elementwise mean of the predecessor and the target
#[derive(Debug, Clone, Copy, Default)]
pub struct Blend;

impl FrameSynthesizer for Blend {
    fn name(&self) -> &'static str {
        "blend"
    }

    fn synthesize(&mut self, previous: &Frame, target: &Frame) -> Result<Frame> {
        previous.mean(target)
    }
}

#[cfg(test)]
mod tests {
    use crate::resampler::plan_upsample;
    use crate::strategy::synthesize;
    use reframe_core::{FlowConfig, Frame, FrameSequence, NoProgress, Shape, Strategy};

    fn blend(values: &[u8], new_length: usize) -> Vec<u8> {
        let frames = values
            .iter()
            .map(|&v| Frame::filled(Shape::new(1, 1, 1), v))
            .collect();
        let input = FrameSequence::from_frames(frames).unwrap();
        let mut buffer = plan_upsample(&input, new_length).unwrap();
        synthesize(&mut buffer, Strategy::Blend, &FlowConfig::default(), &mut NoProgress).unwrap();
        buffer
            .into_sequence()
            .unwrap()
            .iter()
            .map(|f| f.data()[0])
            .collect()
    }

    #[test]
    fn test_ratio_two_scenario() {
        assert_eq!(blend(&[10, 20, 30], 6), vec![10, 15, 20, 25, 30, 15]);
    }

    #[test]
    fn test_chunked_cascade_towards_chunk_end() {
        // step 3: each gap blends towards the next anchor, not symmetrically
        assert_eq!(
            blend(&[0, 90, 180], 9),
            vec![0, 45, 67, 90, 135, 157, 180, 90, 45]
        );
    }

    #[test]
    fn test_remainder_blends_with_black() {
        assert_eq!(
            blend(&[100, 200, 40], 7),
            vec![100, 150, 200, 120, 40, 20, 10]
        );
    }

    #[test]
    fn test_multichannel_blend() {
        let a = Frame::new(vec![0, 100, 200, 50], 2, 1, 2).unwrap();
        let b = Frame::new(vec![100, 100, 0, 51], 2, 1, 2).unwrap();
        let input = FrameSequence::from_frames(vec![a, b]).unwrap();
        let mut buffer = plan_upsample(&input, 4).unwrap();
        synthesize(&mut buffer, Strategy::Blend, &FlowConfig::default(), &mut NoProgress).unwrap();
        assert_eq!(buffer.frame(1).unwrap().data(), &[50, 100, 100, 50]);
        assert_eq!(buffer.frame(3).unwrap().data(), &[50, 50, 0, 25]);
    }
}
