//! Session configuration.

use std::time::Duration;

use hand_signal::Calibration;

use crate::device::CaptureConstraints;

/// Configuration fixed at session construction.  Calibration can still be
/// changed later through the session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    pub constraints:   CaptureConstraints,
    pub calibration:   Calibration,
    /// Upper bound on waiting for the stream-ready signal.
    pub ready_timeout: Duration,
    /// Interval between stream-ready checks.
    pub ready_poll:    Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            constraints:   CaptureConstraints::default(),
            calibration:   Calibration::default(),
            ready_timeout: Duration::from_secs(10),
            ready_poll:    Duration::from_millis(10),
        }
    }
}

impl SessionConfig {
    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_ready_poll(mut self, poll: Duration) -> Self {
        self.ready_poll = poll;
        self
    }
}
