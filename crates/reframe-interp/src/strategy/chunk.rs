//! Chunk walking shared by blend and motion-compensated synthesis
//!
//! A step of exactly 2 leaves one pending slot per gap, filled from its two
//! neighbours. Any other step fills each gap left to right; every pending
//! slot sees the gap's opening anchor, its filled predecessor and the gap's
//! closing anchor. Slots after the last anchor have no closing anchor and
//! are paired with a black frame.

use super::FrameSynthesizer;
use crate::buffer::OutputBuffer;
use reframe_core::{normalize, Error, ProgressSink, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Regime {
    /// One pending slot between neighbouring anchors
    Pairwise,
    /// `step - 1` pending slots cascading towards the chunk's last slot
    Chunked,
}

impl Regime {
    pub(crate) fn for_step(step: usize) -> Self {
        if step == 2 {
            Regime::Pairwise
        } else {
            Regime::Chunked
        }
    }
}

/// Fill every pending slot of `buffer` with `synth`
pub(crate) fn fill(
    buffer: &mut OutputBuffer,
    synth: &mut dyn FrameSynthesizer,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    let regime = Regime::for_step(buffer.step());
    debug!("{} regime {:?}, step {}", synth.name(), regime, buffer.step());

    match regime {
        Regime::Pairwise => fill_pairwise(buffer, synth, progress)?,
        Regime::Chunked => fill_chunked(buffer, synth, progress)?,
    }
    fill_tail(buffer, synth)?;
    progress.report(100);
    Ok(())
}

fn fill_pairwise(
    buffer: &mut OutputBuffer,
    synth: &mut dyn FrameSynthesizer,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    let limit = (buffer.anchor_count() * 2).min(buffer.len());

    for i in 0..limit {
        progress.report(normalize(i, 0, limit.saturating_sub(1)));
        if !buffer.is_pending(i) {
            continue;
        }

        let previous = buffer.predecessor(i)?.clone();
        let next = match buffer.frame(i + 1) {
            Some(frame) if i + 1 < limit => frame.clone(),
            _ => previous.black_like(),
        };
        let frame = synth
            .synthesize(&previous, &next)
            .map_err(|e| e.at_index(i))?;
        buffer.fill(i, frame)?;
    }

    Ok(())
}

fn fill_chunked(
    buffer: &mut OutputBuffer,
    synth: &mut dyn FrameSynthesizer,
    progress: &mut dyn ProgressSink,
) -> Result<()> {
    let step = buffer.step();
    let last_slot = buffer.len().saturating_sub(1);

    for i in 1..buffer.anchor_count() {
        let end = i * step;
        let start = end - step;
        let Some(last) = buffer.frame(end).cloned() else {
            break;
        };
        let anchor = buffer
            .frame(start)
            .cloned()
            .ok_or(Error::IncompleteBuffer { index: start })?;

        for z in start + 1..end {
            if !buffer.is_pending(z) {
                continue;
            }
            let previous = buffer.predecessor(z)?.clone();
            let frame = synth
                .synthesize_in_gap(&anchor, &previous, &last, z - start)
                .map_err(|e| e.at_index(z))?;
            buffer.fill(z, frame)?;
        }

        progress.report(normalize(end, 0, last_slot));
    }

    Ok(())
}

/// Cascade towards black after the last anchor
fn fill_tail(buffer: &mut OutputBuffer, synth: &mut dyn FrameSynthesizer) -> Result<()> {
    let start = buffer.last_anchor();
    let anchor = buffer
        .frame(start)
        .cloned()
        .ok_or(Error::IncompleteBuffer { index: start })?;
    let black = anchor.black_like();

    for i in start + 1..buffer.len() {
        if !buffer.is_pending(i) {
            continue;
        }
        let previous = buffer.predecessor(i)?.clone();
        let frame = synth
            .synthesize_in_gap(&anchor, &previous, &black, i - start)
            .map_err(|e| e.at_index(i))?;
        buffer.fill(i, frame)?;
    }
    Ok(())
}
