//! reframe Interp - Temporal resampling and frame synthesis
//!
//! Converting L frames to L' frames happens in two steps:
//!
//! 1. [`plan_upsample`] places input frame `i` at output slot `i * step`
//!    (`step = round(L' / L)`) and marks every other slot pending, or
//!    [`plan_downsample`] keeps every `round(L / L')`-th frame.
//! 2. [`synthesize`] fills the pending slots with one [`Strategy`]:
//!    duplication, linear blending or motion-compensated interpolation.
//!
//! [`ConversionPipeline`] wires both steps between a frame source and sink.
//!
//! [`Strategy`]: reframe_core::Strategy

pub mod buffer;
pub mod pipeline;
pub mod resampler;
pub mod strategy;

pub use buffer::{OutputBuffer, Slot};
pub use pipeline::{ConversionPipeline, ConversionSummary};
pub use resampler::{plan_downsample, plan_upsample, Direction, InterpolationPlan};
pub use strategy::{fill_duplicates, synthesize, Blend, FrameSynthesizer, MotionCompensate};

#[cfg(test)]
mod tests {
    use super::*;
    use reframe_core::{FlowBackend, FlowConfig, Frame, FrameSequence, NoProgress, Shape, Strategy};

    const STRATEGIES: [Strategy; 4] = [
        Strategy::Duplicate,
        Strategy::Blend,
        Strategy::MotionCompensate(FlowBackend::Dense),
        Strategy::MotionCompensate(FlowBackend::Sparse),
    ];

    fn textured(seed: u8) -> Frame {
        let data = (0..6 * 4 * 3)
            .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed))
            .collect();
        Frame::new(data, 6, 4, 3).unwrap()
    }

    fn input() -> FrameSequence {
        FrameSequence::from_frames((0..4).map(|i| textured(i * 50)).collect()).unwrap()
    }

    #[test]
    fn test_equal_length_is_identity_for_every_strategy() {
        for strategy in STRATEGIES {
            let input = input();
            let mut buffer = plan_upsample(&input, input.len()).unwrap();
            synthesize(&mut buffer, strategy, &FlowConfig::default(), &mut NoProgress).unwrap();
            assert_eq!(buffer.into_sequence().unwrap(), input, "{}", strategy);
        }
    }

    #[test]
    fn test_anchors_survive_every_strategy() {
        for strategy in STRATEGIES {
            for new_length in [5, 8, 11, 12] {
                let input = input();
                let mut buffer = plan_upsample(&input, new_length).unwrap();
                synthesize(&mut buffer, strategy, &FlowConfig::default(), &mut NoProgress).unwrap();
                assert_eq!(buffer.pending_count(), 0);

                let step = buffer.step();
                let output = buffer.into_sequence().unwrap();
                assert_eq!(output.len(), new_length);
                for (i, frame) in input.iter().enumerate() {
                    if i * step < new_length {
                        assert_eq!(output.get(i * step), Some(frame), "{} slot {}", strategy, i * step);
                    }
                }
                assert_eq!(output.shape(), Some(Shape::new(6, 4, 3)));
            }
        }
    }

    #[test]
    fn test_progress_finishes_at_100() {
        for strategy in STRATEGIES {
            let mut last = None;
            let mut sink = |p: u8| last = Some(p);
            let mut buffer = plan_upsample(&input(), 8).unwrap();
            synthesize(&mut buffer, strategy, &FlowConfig::default(), &mut sink).unwrap();
            assert_eq!(last, Some(100), "{}", strategy);
        }
    }
}
