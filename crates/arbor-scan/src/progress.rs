//! Scan progress reporting.

use tokio::sync::broadcast;

/// Progress information during a scan.
///
/// `value` is monotonically non-decreasing over one scan and stays
/// within `[0, max]`; `max` is fixed before the scan starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Work completed so far, on the scale established by `max`.
    pub value: u64,
    /// Upper bound of the progress scale.
    pub max: u64,
}

impl ScanProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.value as f64 / self.max as f64
        }
    }
}

/// Accumulates fractional per-entry progress shares and emits integer
/// updates only when the reported value actually advances.
pub(crate) struct ProgressGauge<'a> {
    tx: &'a broadcast::Sender<ScanProgress>,
    max: u64,
    accumulated: f64,
    last_emitted: u64,
}

impl<'a> ProgressGauge<'a> {
    pub fn new(tx: &'a broadcast::Sender<ScanProgress>, max: u64) -> Self {
        // Establish the range up front with an initial zero report.
        let _ = tx.send(ScanProgress { value: 0, max });
        Self {
            tx,
            max,
            accumulated: 0.0,
            last_emitted: 0,
        }
    }

    /// Credit a share of the total range. Shares are fractional; the
    /// emitted integer value is clamped to `max` and never goes back.
    pub fn add(&mut self, share: f64) {
        self.accumulated += share.max(0.0);
        let value = (self.accumulated as u64).min(self.max);
        if value > self.last_emitted {
            self.last_emitted = value;
            let _ = self.tx.send(ScanProgress {
                value,
                max: self.max,
            });
        }
    }

    /// Report completion. Rounding of fractional shares leaves the
    /// accumulated value short of `max`; a finished scan still ends at
    /// the top of the range.
    pub fn finish(&mut self) {
        if self.last_emitted < self.max {
            self.last_emitted = self.max;
            let _ = self.tx.send(ScanProgress {
                value: self.max,
                max: self.max,
            });
        }
    }
}
