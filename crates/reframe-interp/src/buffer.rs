//! Sparse output buffer produced by the resampler

use reframe_core::{Error, Frame, FrameSequence, Result, Shape};

/// One output position
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Filled(Frame),
    Pending,
}

impl Slot {
    pub fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }

    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Slot::Filled(frame) => Some(frame),
            Slot::Pending => None,
        }
    }
}

/// Output positions with anchors placed every `step` slots
///
/// Anchor `i` sits at slot `i * step`; anchors are never overwritten.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    slots: Vec<Slot>,
    step: usize,
    anchors: usize,
    shape: Shape,
}

impl OutputBuffer {
    pub(crate) fn new(slots: Vec<Slot>, step: usize, anchors: usize, shape: Shape) -> Self {
        Self {
            slots,
            step,
            anchors,
            shape,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Number of input frames placed
    pub fn anchor_count(&self) -> usize {
        self.anchors
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.slots.get(index).and_then(Slot::frame)
    }

    pub fn is_pending(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Slot::is_pending)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_pending()).count()
    }

    pub fn is_anchor(&self, index: usize) -> bool {
        index % self.step == 0 && index / self.step < self.anchors
    }

    /// Slot of the last placed input frame
    pub fn last_anchor(&self) -> usize {
        self.anchors.saturating_sub(1) * self.step
    }

    /// Frame in the slot immediately before `index`
    pub fn predecessor(&self, index: usize) -> Result<&Frame> {
        let previous = index
            .checked_sub(1)
            .ok_or(Error::IncompleteBuffer { index })?;
        self.frame(previous)
            .ok_or(Error::IncompleteBuffer { index: previous })
    }

    /// Fill a pending slot
    pub fn fill(&mut self, index: usize, frame: Frame) -> Result<()> {
        frame.ensure_shape(self.shape, index)?;
        match self.slots.get_mut(index) {
            Some(slot @ Slot::Pending) => {
                *slot = Slot::Filled(frame);
                Ok(())
            }
            Some(Slot::Filled(_)) => Err(Error::InvalidFrame(format!(
                "slot {} is already filled",
                index
            ))),
            None => Err(Error::InvalidFrame(format!(
                "slot {} is outside a buffer of {}",
                index,
                self.slots.len()
            ))),
        }
    }

    /// Convert to a sequence, failing on the first pending slot
    pub fn into_sequence(self) -> Result<FrameSequence> {
        let frames = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| match slot {
                Slot::Filled(frame) => Ok(frame),
                Slot::Pending => Err(Error::IncompleteBuffer { index }),
            })
            .collect::<Result<Vec<_>>>()?;
        FrameSequence::from_frames(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(value: u8) -> Frame {
        Frame::filled(Shape::new(1, 1, 1), value)
    }

    fn buffer() -> OutputBuffer {
        OutputBuffer::new(
            vec![Slot::Filled(gray(1)), Slot::Pending, Slot::Filled(gray(2)), Slot::Pending],
            2,
            2,
            Shape::new(1, 1, 1),
        )
    }

    #[test]
    fn test_anchor_layout() {
        let buffer = buffer();
        assert!(buffer.is_anchor(0));
        assert!(buffer.is_anchor(2));
        assert!(!buffer.is_anchor(1));
        assert!(!buffer.is_anchor(4));
        assert_eq!(buffer.last_anchor(), 2);
        assert_eq!(buffer.pending_count(), 2);
    }

    #[test]
    fn test_fill_refuses_filled_and_foreign_shapes() {
        let mut buffer = buffer();
        assert!(buffer.fill(0, gray(9)).is_err());
        assert!(buffer.fill(9, gray(9)).is_err());
        assert!(matches!(
            buffer.fill(1, Frame::black(Shape::new(2, 1, 1))),
            Err(Error::DimensionMismatch { index: 1, .. })
        ));
        buffer.fill(1, gray(9)).unwrap();
        assert_eq!(buffer.frame(1), Some(&gray(9)));
    }

    #[test]
    fn test_predecessor_bounds() {
        let buffer = buffer();
        assert!(matches!(
            buffer.predecessor(0),
            Err(Error::IncompleteBuffer { index: 0 })
        ));
        assert!(matches!(
            buffer.predecessor(2),
            Err(Error::IncompleteBuffer { index: 1 })
        ));
        assert_eq!(buffer.predecessor(1).unwrap(), &gray(1));
    }

    #[test]
    fn test_into_sequence_requires_every_slot() {
        let result = buffer().into_sequence();
        assert!(matches!(result, Err(Error::IncompleteBuffer { index: 1 })));

        let mut buffer = buffer();
        buffer.fill(1, gray(5)).unwrap();
        buffer.fill(3, gray(6)).unwrap();
        let sequence = buffer.into_sequence().unwrap();
        assert_eq!(sequence.len(), 4);
    }
}
