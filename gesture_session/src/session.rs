//! [`GestureSession`] owns the camera stream, the detector and the
//! detection loop, and publishes the current [`GestureState`].
//!
//! ```text
//!  Uninitialized ──initialize──▶ Ready ──start_detection──▶ Detecting
//!        ▲                        ▲ │                          │
//!        │ (failure)              │ └──────stop_detection◀─────┘
//!        │                        │
//!   CleanedUp ◀──────cleanup (from any state)
//! ```

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use hand_signal::{Calibration, GestureState};

use crate::clock::{CancelToken, FrameClock, IntervalClock};
use crate::config::SessionConfig;
use crate::detection::{DetectionLoop, Parked, Shared, StreamGuard};
use crate::detector::HandDetector;
use crate::device::{MediaDevices, PermissionState, VideoFrame, VideoStream};
use crate::error::{CaptureError, ErrorKind};

// ════════════════════════════════════════════════════════════════════════════
// SessionState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Detecting,
    CleanedUp,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSession
// ════════════════════════════════════════════════════════════════════════════

struct Worker {
    cancel: CancelToken,
    /// `None` if the thread never received its resources.
    handle: JoinHandle<Option<Parked>>,
}

pub struct GestureSession {
    config:  SessionConfig,
    state:   SessionState,

    // ── exclusively owned resources (moved to the worker while detecting) ──
    devices:  Box<dyn MediaDevices>,
    detector: Option<Box<dyn HandDetector>>,
    stream:   Option<StreamGuard>,
    clock:    Option<Box<dyn FrameClock>>,
    detector_loaded: bool,
    /// The detector went down with a panicked detection thread.
    detector_lost:   bool,

    worker:  Option<Worker>,
    shared:  Arc<Shared>,
}

impl GestureSession {
    /// New, uninitialized session paced by an [`IntervalClock`].
    pub fn new(
        config:   SessionConfig,
        devices:  impl MediaDevices + 'static,
        detector: impl HandDetector + 'static,
    ) -> Self {
        GestureSession {
            config,
            state:    SessionState::Uninitialized,
            devices:  Box::new(devices),
            detector: Some(Box::new(detector)),
            stream:   None,
            clock:    Some(Box::new(IntervalClock::default())),
            detector_loaded: false,
            detector_lost:   false,
            worker:   None,
            shared:   Arc::new(Shared::new(config.calibration)),
        }
    }

    /// Replace the frame clock.  Takes effect the next time detection starts.
    pub fn with_clock(mut self, clock: impl FrameClock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn state(&self) -> SessionState { self.state }

    pub fn config(&self) -> &SessionConfig { &self.config }

    /// Initialized and detecting, with the detection loop still running.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Detecting
            && self.worker.as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    // ── initialize ────────────────────────────────────────────────────────

    /// Load the detector and acquire the camera.  A no-op when already
    /// initialized.  On failure everything acquired so far is released and
    /// the session is back to `Uninitialized`.
    pub fn initialize(&mut self) -> Result<(), CaptureError> {
        if matches!(self.state, SessionState::Ready | SessionState::Detecting) {
            debug!(state = ?self.state, "initialize: already initialized");
            return Ok(());
        }

        self.state = SessionState::Initializing;
        info!("initializing gesture session");

        match self.acquire() {
            Ok(stream) => {
                let size = stream.frame_size();
                self.stream = Some(stream);
                self.state = SessionState::Ready;
                info!(width = size.width, height = size.height, "gesture session ready");
                Ok(())
            }
            Err(err) => {
                self.release_detector();
                self.state = SessionState::Uninitialized;
                warn!(kind = %err.kind, detail = %err.detail, "gesture session failed to initialize");
                Err(err)
            }
        }
    }

    fn acquire(&mut self) -> Result<StreamGuard, CaptureError> {
        if !self.devices.is_supported() {
            return Err(CaptureError::new(
                ErrorKind::UnsupportedBrowser,
                "no media capture API available",
            ));
        }

        match self.devices.permission() {
            PermissionState::Denied => {
                return Err(CaptureError::new(
                    ErrorKind::PermissionDenied,
                    "camera permission is denied",
                ));
            }
            PermissionState::Unknown => debug!("camera permission state unknown; requesting anyway"),
            PermissionState::Granted | PermissionState::Prompt => {}
        }

        let lost = self.detector_lost;
        let detector = self.detector.as_mut().ok_or_else(|| {
            let detail = if lost {
                "hand detector was lost when the detection thread panicked"
            } else {
                "hand detector is unavailable"
            };
            CaptureError::new(ErrorKind::Unknown, detail)
        })?;
        info!("loading hand detector");
        detector.load()?;
        self.detector_loaded = true;

        let c = self.config.constraints;
        info!(width = c.ideal_width, height = c.ideal_height, facing = ?c.facing, "requesting camera stream");
        let mut stream = StreamGuard::new(self.devices.open(&c)?);

        // On error the guard stops the stream.
        self.wait_until_ready(&mut *stream)?;
        Ok(stream)
    }

    fn wait_until_ready(&self, stream: &mut dyn VideoStream) -> Result<(), CaptureError> {
        let deadline = Instant::now() + self.config.ready_timeout;
        loop {
            if stream.poll_ready()? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::new(
                    ErrorKind::Timeout,
                    format!(
                        "camera stream not ready after {} ms",
                        self.config.ready_timeout.as_millis()
                    ),
                ));
            }
            thread::sleep(self.config.ready_poll);
        }
    }

    // ── detection loop ────────────────────────────────────────────────────

    /// `Ready → Detecting`.  No-op in any other state.
    pub fn start_detection(&mut self) {
        if self.state != SessionState::Ready {
            debug!(state = ?self.state, "start_detection ignored");
            return;
        }

        let (stream, detector, clock) = match (self.stream.take(), self.detector.take(), self.clock.take()) {
            (Some(s), Some(d), Some(c)) => (s, d, c),
            (s, d, c) => {
                self.stream = s;
                self.detector = d;
                self.clock = c;
                error!("session resources missing; detection not started");
                return;
            }
        };

        // Frames presented from here on belong to this run.
        let mut clock = clock;
        clock.reset();

        let cancel = CancelToken::new();
        let detection = DetectionLoop::new(stream, detector, self.shared.clone(), cancel.clone());

        // Resources go over a channel so a failed spawn leaves them here.
        let (handoff, inbox) = mpsc::channel::<(DetectionLoop, Box<dyn FrameClock>)>();
        let spawned = thread::Builder::new()
            .name("gesture-detect".to_string())
            .spawn(move || inbox.recv().ok().map(|(detection, clock)| detection.run(clock)));

        match spawned {
            Ok(handle) => match handoff.send((detection, clock)) {
                Ok(()) => {
                    self.worker = Some(Worker { cancel, handle });
                    self.state = SessionState::Detecting;
                    info!("gesture detection started");
                }
                Err(mpsc::SendError((detection, clock))) => {
                    error!("detection thread exited before starting");
                    self.park(detection.into_parked(clock, false));
                }
            },
            Err(e) => {
                error!(error = %e, "could not spawn detection thread");
                self.park(detection.into_parked(clock, false));
            }
        }
    }

    fn park(&mut self, parked: Parked) {
        self.stream = Some(parked.stream);
        self.detector = Some(parked.detector);
        self.clock = Some(parked.clock);
    }

    /// `Detecting → Ready`.  Waits for an in-flight detection to finish and
    /// discards its result; no further frames are processed afterwards.
    pub fn stop_detection(&mut self) {
        let Some(worker) = self.worker.take() else {
            debug!("stop_detection: not detecting");
            return;
        };

        worker.cancel.cancel();
        match worker.handle.join() {
            Ok(Some(parked)) => {
                if parked.panicked {
                    warn!("detection loop had stopped after a panic");
                }
                self.park(parked);
                self.state = SessionState::Ready;
                info!("gesture detection stopped");
            }
            Ok(None) | Err(_) => {
                // The stream guard stopped the camera while unwinding.
                error!("detection thread panicked; hand detector lost");
                self.detector_loaded = false;
                self.detector_lost = true;
                self.state = SessionState::Uninitialized;
            }
        }
    }

    // ── queries / calibration ─────────────────────────────────────────────

    /// Copy of the latest published state.  Valid in every lifecycle state.
    pub fn gesture_state(&self) -> GestureState {
        *self.shared.gesture.read()
    }

    /// Copy of the last grabbed frame, for display only.
    pub fn latest_frame(&self) -> Option<VideoFrame> {
        self.shared.frame.read().clone()
    }

    pub fn calibration(&self) -> Calibration {
        *self.shared.calibration.read()
    }

    /// Move the neutral center.  Applies from the next processed frame.
    pub fn calibrate(&self, center_x: f32) {
        self.shared.calibration.write().center_x = center_x;
        info!(center_x, "calibrated center position");
    }

    /// Replace center and dead zone together.
    pub fn set_calibration(&self, calibration: Calibration) {
        *self.shared.calibration.write() = calibration;
        info!(center_x = calibration.center_x, dead_zone = calibration.dead_zone, "calibration replaced");
    }

    // ── cleanup ───────────────────────────────────────────────────────────

    /// Stop detection, stop the camera, dispose the detector and reset the
    /// published state.  Safe from any state and safe to repeat.
    pub fn cleanup(&mut self) {
        let had_resources = self.worker.is_some() || self.stream.is_some() || self.detector_loaded;

        self.stop_detection();
        // Dropping the guard stops the stream.
        self.stream = None;
        self.release_detector();

        *self.shared.frame.write() = None;
        *self.shared.gesture.write() = GestureState::default();
        self.state = SessionState::CleanedUp;

        if had_resources {
            info!("gesture session cleaned up");
        } else {
            debug!("cleanup: nothing to release");
        }
    }

    fn release_detector(&mut self) {
        if !self.detector_loaded { return; }
        if let Some(detector) = self.detector.as_mut() {
            detector.dispose();
        }
        self.detector_loaded = false;
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clock::stepped_clock;
    use crate::error::DeviceError;
    use crate::sim::{ScriptedDetector, SimDevices};

    fn fast_config() -> SessionConfig {
        SessionConfig::default()
            .with_ready_timeout(Duration::from_millis(50))
            .with_ready_poll(Duration::from_millis(1))
    }

    #[test]
    fn starts_uninitialized_with_default_state() {
        let (detector, _script) = ScriptedDetector::new();
        let session = GestureSession::new(fast_config(), SimDevices::new(), detector);
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(!session.is_ready());
        assert_eq!(session.gesture_state(), GestureState::default());
        assert!(session.latest_frame().is_none());
    }

    #[test]
    fn initialize_is_idempotent() {
        let devices = SimDevices::new();
        let counters = devices.counters();
        let (detector, script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        session.initialize().unwrap();
        session.initialize().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(counters.opens(), 1);
        assert_eq!(script.loads(), 1);
    }

    #[test]
    fn unsupported_host_fails_fast() {
        let devices = SimDevices::unsupported();
        let counters = devices.counters();
        let (detector, script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        let err = session.initialize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedBrowser);
        assert_eq!(counters.opens(), 0);
        assert_eq!(script.loads(), 0);
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn denied_permission_skips_acquisition() {
        let devices = SimDevices::new().with_permission(PermissionState::Denied);
        let counters = devices.counters();
        let (detector, _script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        assert_eq!(session.initialize().unwrap_err().kind, ErrorKind::PermissionDenied);
        assert_eq!(counters.opens(), 0);
    }

    #[test]
    fn open_failure_is_classified_and_detector_released() {
        let devices = SimDevices::new().failing_open(DeviceError::new("NotReadableError", "busy"));
        let (detector, script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        assert_eq!(session.initialize().unwrap_err().kind, ErrorKind::CameraInUse);
        assert_eq!(script.loads(), 1);
        assert_eq!(script.disposals(), 1);
    }

    #[test]
    fn detector_load_failure_is_reported() {
        let devices = SimDevices::new();
        let counters = devices.counters();
        let (detector, script) = ScriptedDetector::new();
        script.fail_load(DeviceError::new("NetworkError", "model download failed"));
        let mut session = GestureSession::new(fast_config(), devices, detector);
        let err = session.initialize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.detail.contains("model download failed"));
        assert_eq!(counters.opens(), 0);
        assert_eq!(script.disposals(), 0);
    }

    #[test]
    fn never_ready_stream_times_out_and_is_stopped() {
        let devices = SimDevices::new().never_ready();
        let counters = devices.counters();
        let (detector, script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        let err = session.initialize().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(counters.opens(), 1);
        assert_eq!(counters.stops(), 1);
        assert_eq!(script.disposals(), 1);
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn ready_error_stops_stream() {
        let devices = SimDevices::new().failing_ready(DeviceError::new("SecurityError", "insecure"));
        let counters = devices.counters();
        let (detector, _script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        assert_eq!(session.initialize().unwrap_err().kind, ErrorKind::InsecureContext);
        assert_eq!(counters.stops(), 1);
    }

    #[test]
    fn slow_stream_within_deadline_succeeds() {
        let devices = SimDevices::new().ready_after(5);
        let (detector, _script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), devices, detector);
        session.initialize().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn start_before_initialize_is_ignored() {
        let (detector, _script) = ScriptedDetector::new();
        let (clock, stepper) = stepped_clock();
        let mut session = GestureSession::new(fast_config(), SimDevices::new(), detector).with_clock(clock);
        session.start_detection();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(!stepper.step_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn stop_twice_is_harmless() {
        let (detector, _script) = ScriptedDetector::new();
        let (clock, _stepper) = stepped_clock();
        let mut session = GestureSession::new(fast_config(), SimDevices::new(), detector).with_clock(clock);
        session.initialize().unwrap();
        session.start_detection();
        assert!(session.is_ready());
        session.stop_detection();
        assert_eq!(session.state(), SessionState::Ready);
        session.stop_detection();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn cleanup_before_initialize() {
        let (detector, script) = ScriptedDetector::new();
        let mut session = GestureSession::new(fast_config(), SimDevices::new(), detector);
        session.cleanup();
        session.cleanup();
        assert_eq!(session.state(), SessionState::CleanedUp);
        assert_eq!(script.disposals(), 0);
        assert_eq!(session.gesture_state(), GestureState::default());
    }

    #[test]
    fn calibrate_updates_calibration_only() {
        let (detector, _script) = ScriptedDetector::new();
        let session = GestureSession::new(fast_config(), SimDevices::new(), detector);
        let before = session.gesture_state();
        session.calibrate(0.3);
        assert_eq!(session.calibration().center_x, 0.3);
        assert_eq!(session.calibration().dead_zone, Calibration::DEFAULT_DEAD_ZONE);
        assert_eq!(session.gesture_state(), before);
        session.set_calibration(Calibration::new(0.6, 0.1));
        assert_eq!(session.calibration(), Calibration::new(0.6, 0.1));
    }

    #[test]
    fn drop_releases_camera() {
        let devices = SimDevices::new();
        let counters = devices.counters();
        let (detector, script) = ScriptedDetector::new();
        {
            let mut session = GestureSession::new(fast_config(), devices, detector);
            session.initialize().unwrap();
            session.start_detection();
        }
        assert_eq!(counters.stops(), 1);
        assert_eq!(script.disposals(), 1);
    }
}
