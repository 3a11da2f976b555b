// Rate limiting for repeated diagnostics
// Keeps a misbehaving host clock (scrubbing, seeking) from flooding the log

/// Lets one report through per `interval` seconds of host time and counts the rest
#[derive(Debug, Clone)]
pub struct DiagnosticThrottle {
    interval: f64,
    last_report: Option<f64>,
    suppressed: u64,
}

impl DiagnosticThrottle {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(0.0),
            last_report: None,
            suppressed: 0,
        }
    }

    /// Returns `Some(suppressed_since_last_report)` when a report may go out at `now`.
    ///
    /// The window is measured in either direction so a host clock that jumped
    /// back does not stay silent until it catches up again.
    pub fn check(&mut self, now: f64) -> Option<u64> {
        let allowed = match self.last_report {
            None => true,
            Some(last) => (now - last).abs() >= self.interval,
        };

        if allowed {
            self.last_report = Some(now);
            Some(std::mem::take(&mut self.suppressed))
        } else {
            self.suppressed += 1;
            None
        }
    }

    /// Number of reports swallowed since the last one that went out
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    pub fn reset(&mut self) {
        self.last_report = None;
        self.suppressed = 0;
    }
}
