//! The per-frame detect → process → publish step and the loop around it.

use std::ops::{Deref, DerefMut};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, warn};

use hand_signal::{compute_gesture_state, Calibration, GestureState};

use crate::clock::{CancelToken, FrameClock};
use crate::detector::HandDetector;
use crate::device::{VideoFrame, VideoStream};

// ════════════════════════════════════════════════════════════════════════════
// Shared state between the session and the loop thread
// ════════════════════════════════════════════════════════════════════════════

pub(crate) struct Shared {
    pub gesture:     RwLock<GestureState>,
    pub calibration: RwLock<Calibration>,
    pub frame:       RwLock<Option<VideoFrame>>,
}

impl Shared {
    pub fn new(calibration: Calibration) -> Self {
        Shared {
            gesture:     RwLock::new(GestureState::default()),
            calibration: RwLock::new(calibration),
            frame:       RwLock::new(None),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StreamGuard
// ════════════════════════════════════════════════════════════════════════════

/// A live stream that is stopped when dropped, wherever that happens.
pub(crate) struct StreamGuard(Box<dyn VideoStream>);

impl StreamGuard {
    pub fn new(stream: Box<dyn VideoStream>) -> Self {
        StreamGuard(stream)
    }
}

impl Deref for StreamGuard {
    type Target = dyn VideoStream;

    fn deref(&self) -> &Self::Target { self.0.as_ref() }
}

impl DerefMut for StreamGuard {
    fn deref_mut(&mut self) -> &mut Self::Target { self.0.as_mut() }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.stop();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionLoop
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum StepOutcome {
    /// A hand was found and its state published.
    Hand(GestureState),
    /// No hand this frame; the frozen state was published.
    NoHand(GestureState),
    /// Frame grab or detection failed; nothing published.
    Skipped,
    /// Cancelled while detecting; the result was thrown away.
    Discarded,
}

/// Resources handed back when the loop ends.
pub(crate) struct Parked {
    pub stream:   StreamGuard,
    pub detector: Box<dyn HandDetector>,
    pub clock:    Box<dyn FrameClock>,
    /// The loop ended because a step panicked.
    pub panicked: bool,
}

pub(crate) struct DetectionLoop {
    stream:   StreamGuard,
    detector: Box<dyn HandDetector>,
    shared:   Arc<Shared>,
    cancel:   CancelToken,
}

impl DetectionLoop {
    pub fn new(
        stream:   StreamGuard,
        detector: Box<dyn HandDetector>,
        shared:   Arc<Shared>,
        cancel:   CancelToken,
    ) -> Self {
        DetectionLoop { stream, detector, shared, cancel }
    }

    /// One frame.  Errors are logged and swallowed.
    pub fn step(&mut self) -> StepOutcome {
        let frame = match self.stream.grab_frame() {
            Ok(f)  => f,
            Err(e) => {
                warn!(error = %e, "frame grab failed; skipping frame");
                return StepOutcome::Skipped;
            }
        };

        let result = self.detector.estimate_hands(&frame);

        if self.cancel.is_cancelled() {
            debug!(sequence = frame.sequence, "detection finished after stop; result discarded");
            return StepOutcome::Discarded;
        }

        let size = frame.size;
        *self.shared.frame.write() = Some(frame);

        let hands = match result {
            Ok(h)  => h,
            Err(e) => {
                warn!(error = %e, "hand detection failed; keeping last state");
                return StepOutcome::Skipped;
            }
        };

        let calibration = *self.shared.calibration.read();
        let mut published = self.shared.gesture.write();
        match hands.first() {
            Some(hand) => {
                let state = compute_gesture_state(hand, size, &calibration);
                *published = state;
                StepOutcome::Hand(state)
            }
            None => {
                let frozen = published.without_hand();
                *published = frozen;
                StepOutcome::NoHand(frozen)
            }
        }
    }

    /// Run until `clock` stops handing out frames, then give the resources
    /// back.  A panicking step ends the loop; the resources still come back.
    /// The caller resets `clock` before handing it over.
    pub fn run(mut self, mut clock: Box<dyn FrameClock>) -> Parked {
        let mut panicked = false;
        while clock.next_frame(&self.cancel) {
            if panic::catch_unwind(AssertUnwindSafe(|| self.step())).is_err() {
                error!("detection step panicked; detection loop stopped");
                panicked = true;
                break;
            }
            clock.frame_done();
            if self.cancel.is_cancelled() { break; }
        }
        self.into_parked(clock, panicked)
    }

    pub fn into_parked(self, clock: Box<dyn FrameClock>, panicked: bool) -> Parked {
        Parked { stream: self.stream, detector: self.detector, clock, panicked }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{CaptureConstraints, MediaDevices};
    use crate::error::{DetectError, DeviceError};
    use crate::sim::{fingers_up, pose_hand, ScriptedDetector, SimDevices};
    use hand_signal::{DetectedHand, FrameSize, Keypoint, MoveDirection};

    fn open_stream() -> StreamGuard {
        StreamGuard::new(SimDevices::new().open(&CaptureConstraints::default()).unwrap())
    }

    fn left_hand() -> DetectedHand {
        DetectedHand::new(pose_hand(Keypoint::new(60.0, 240.0), fingers_up(2)), Some(0.9))
    }

    fn make_loop() -> (DetectionLoop, crate::sim::DetectorScript, Arc<Shared>) {
        let (mut detector, script) = ScriptedDetector::new();
        detector.load().unwrap();
        let shared = Arc::new(Shared::new(Calibration::default()));
        let lp = DetectionLoop::new(open_stream(), Box::new(detector), shared.clone(), CancelToken::new());
        (lp, script, shared)
    }

    #[test]
    fn hand_frame_publishes_state() {
        let (mut lp, script, shared) = make_loop();
        script.push_hand(left_hand());
        let out = lp.step();
        let published = *shared.gesture.read();
        assert_eq!(out, StepOutcome::Hand(published));
        assert_eq!(published.move_direction, MoveDirection::Left);
        assert_eq!(published.fingers_extended, 2);
        assert!(shared.frame.read().is_some());
    }

    #[test]
    fn empty_frame_freezes_last_state() {
        let (mut lp, script, shared) = make_loop();
        script.push_hand(left_hand());
        script.push_no_hand();
        lp.step();
        let before = *shared.gesture.read();
        let out = lp.step();
        let after = *shared.gesture.read();
        assert!(matches!(out, StepOutcome::NoHand(_)));
        assert!(!after.is_hand_detected);
        assert_eq!(after.confidence, 0.0);
        assert_eq!(after.move_direction, before.move_direction);
        assert_eq!(after.fingers_extended, before.fingers_extended);
        assert_eq!(after.hand_height, before.hand_height);
    }

    #[test]
    fn detector_error_leaves_state_alone() {
        let (mut lp, script, shared) = make_loop();
        script.push_hand(left_hand());
        script.push_error("model hiccup");
        lp.step();
        let before = *shared.gesture.read();
        assert_eq!(lp.step(), StepOutcome::Skipped);
        assert_eq!(*shared.gesture.read(), before);
    }

    #[test]
    fn only_first_hand_is_used() {
        let (mut lp, script, shared) = make_loop();
        let right = DetectedHand::new(pose_hand(Keypoint::new(600.0, 240.0), fingers_up(5)), Some(0.5));
        script.push_hands(vec![left_hand(), right]);
        lp.step();
        assert_eq!(shared.gesture.read().move_direction, MoveDirection::Left);
    }

    #[test]
    fn calibration_is_read_every_frame() {
        let (mut lp, script, shared) = make_loop();
        script.set_current(Some(left_hand()));
        lp.step();
        assert_eq!(shared.gesture.read().move_direction, MoveDirection::Left);
        let hand_x = shared.gesture.read().hand_x;
        shared.calibration.write().center_x = hand_x;
        lp.step();
        assert_eq!(shared.gesture.read().move_direction, MoveDirection::Center);
    }

    /// Cancels the loop from inside detection, like a stop arriving mid-frame.
    struct CancellingDetector {
        cancel: CancelToken,
    }

    impl HandDetector for CancellingDetector {
        fn load(&mut self) -> Result<(), DeviceError> { Ok(()) }

        fn estimate_hands(&mut self, _frame: &VideoFrame) -> Result<Vec<DetectedHand>, DetectError> {
            self.cancel.cancel();
            Ok(vec![left_hand()])
        }

        fn dispose(&mut self) {}
    }

    #[test]
    fn result_after_cancel_is_discarded() {
        let cancel = CancelToken::new();
        let shared = Arc::new(Shared::new(Calibration::default()));
        let detector = CancellingDetector { cancel: cancel.clone() };
        let mut lp = DetectionLoop::new(open_stream(), Box::new(detector), shared.clone(), cancel);
        assert_eq!(lp.step(), StepOutcome::Discarded);
        assert_eq!(*shared.gesture.read(), GestureState::default());
    }

    #[test]
    fn frame_size_comes_from_the_frame() {
        let (mut detector, script) = ScriptedDetector::new();
        detector.load().unwrap();
        let stream = StreamGuard::new(
            SimDevices::new()
                .with_frame_size(FrameSize::new(320, 240))
                .open(&CaptureConstraints::default())
                .unwrap(),
        );
        let shared = Arc::new(Shared::new(Calibration::default()));
        let mut lp = DetectionLoop::new(stream, Box::new(detector), shared.clone(), CancelToken::new());
        script.push_hand(DetectedHand::new(pose_hand(Keypoint::new(160.0, 120.0), fingers_up(0)), None));
        lp.step();
        let s = *shared.gesture.read();
        assert!((s.hand_x - 0.5).abs() < 1e-4);
        assert!((s.hand_y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn dropping_the_guard_stops_the_stream() {
        let mut devices = SimDevices::new();
        let counters = devices.counters();
        let guard = StreamGuard::new(devices.open(&CaptureConstraints::default()).unwrap());
        assert_eq!(counters.live_streams(), 1);
        drop(guard);
        assert_eq!(counters.stops(), 1);
    }

    #[test]
    fn panicking_step_ends_loop_and_returns_resources() {
        let (mut detector, script) = ScriptedDetector::new();
        detector.load().unwrap();
        script.push_panic("detector crashed");
        let shared = Arc::new(Shared::new(Calibration::default()));
        let lp = DetectionLoop::new(open_stream(), Box::new(detector), shared.clone(), CancelToken::new());

        let (clock, stepper) = crate::clock::stepped_clock();
        stepper.present();
        let parked = lp.run(Box::new(clock));
        assert!(parked.panicked);
        assert_eq!(script.calls(), 1);
        assert_eq!(*shared.gesture.read(), GestureState::default());
    }
}
