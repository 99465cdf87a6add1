//! Progress reporting for long-running synthesis loops

use tracing::info;

/// Receives completion percentages in [0, 100]
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Logs progress each time another 10% boundary is crossed
#[derive(Debug, Clone)]
pub struct TracingProgress {
    label: String,
    last_logged: Option<u8>,
}

impl TracingProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            last_logged: None,
        }
    }

    /// Highest decile logged so far
    pub fn last_logged(&self) -> Option<u8> {
        self.last_logged
    }
}

impl ProgressSink for TracingProgress {
    fn report(&mut self, percent: u8) {
        let decile = percent.min(100) / 10 * 10;
        if self.last_logged.map_or(true, |last| decile > last) {
            self.last_logged = Some(decile);
            info!("{}: {}%", self.label, decile);
        }
    }
}

/// Normalize `value` within [min, max] to a whole percentage
///
/// Uses `floor(((value - min) / (max - min)) * 100)`; an empty range counts
/// as complete.
pub fn normalize(value: usize, min: usize, max: usize) -> u8 {
    if max <= min {
        return 100;
    }
    let value = value.clamp(min, max);
    (((value - min) as f64 / (max - min) as f64) * 100.0).floor() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0, 0, 10), 0);
        assert_eq!(normalize(5, 0, 10), 50);
        assert_eq!(normalize(10, 0, 10), 100);
        assert_eq!(normalize(1, 0, 3), 33);
        assert_eq!(normalize(2, 0, 3), 66);
        assert_eq!(normalize(7, 0, 0), 100);
        assert_eq!(normalize(20, 0, 10), 100);
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u8| seen.push(p);
            sink.report(10);
            sink.report(100);
        }
        assert_eq!(seen, vec![10, 100]);
    }

    #[test]
    fn test_tracing_progress_deciles() {
        let mut progress = TracingProgress::new("blend");
        assert_eq!(progress.last_logged(), None);
        progress.report(3);
        assert_eq!(progress.last_logged(), Some(0));
        progress.report(19);
        assert_eq!(progress.last_logged(), Some(10));
        progress.report(12);
        assert_eq!(progress.last_logged(), Some(10));
        progress.report(100);
        assert_eq!(progress.last_logged(), Some(100));
    }
}
