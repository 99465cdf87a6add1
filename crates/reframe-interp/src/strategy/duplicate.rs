//! Frame duplication

use crate::buffer::OutputBuffer;
use reframe_core::{normalize, ProgressSink, Result};

/// Fill every pending slot with a copy of the slot before it
///
/// Slot 0 always holds an anchor, so the left-to-right walk always finds a
/// filled predecessor. Copies share the predecessor's sample buffer.
pub fn fill_duplicates(buffer: &mut OutputBuffer, progress: &mut dyn ProgressSink) -> Result<()> {
    let last = buffer.len().saturating_sub(1);

    for i in 0..buffer.len() {
        progress.report(normalize(i, 0, last));
        if buffer.is_pending(i) {
            let previous = buffer.predecessor(i)?.clone();
            buffer.fill(i, previous)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resampler::plan_upsample;
    use reframe_core::{Frame, FrameSequence, NoProgress, Shape};

    fn sequence(values: &[u8]) -> FrameSequence {
        let frames = values
            .iter()
            .map(|&v| Frame::filled(Shape::new(1, 1, 1), v))
            .collect();
        FrameSequence::from_frames(frames).unwrap()
    }

    fn values(buffer: OutputBuffer) -> Vec<u8> {
        buffer
            .into_sequence()
            .unwrap()
            .iter()
            .map(|f| f.data()[0])
            .collect()
    }

    #[test]
    fn test_duplicate_scenario() {
        let mut buffer = plan_upsample(&sequence(&[10, 20, 30]), 6).unwrap();
        fill_duplicates(&mut buffer, &mut NoProgress).unwrap();
        assert_eq!(values(buffer), vec![10, 10, 20, 20, 30, 30]);
    }

    #[test]
    fn test_every_gap_repeats_its_predecessor() {
        for new_length in 4..20 {
            let mut buffer = plan_upsample(&sequence(&[1, 2, 3, 4]), new_length).unwrap();
            fill_duplicates(&mut buffer, &mut NoProgress).unwrap();
            for i in 1..buffer.len() {
                if !buffer.is_anchor(i) {
                    let current = buffer.frame(i).unwrap();
                    let previous = buffer.frame(i - 1).unwrap();
                    assert_eq!(current, previous);
                    assert!(current.shares_buffer(previous));
                }
            }
        }
    }

    #[test]
    fn test_reports_every_slot() {
        let mut buffer = plan_upsample(&sequence(&[1, 2, 3]), 9).unwrap();
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);
        fill_duplicates(&mut buffer, &mut sink).unwrap();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
    }
}
