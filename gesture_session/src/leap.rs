//! LeapMotion-backed [`HandDetector`] (feature `leap`).
//!
//! The LeapC connection lives on its own polling thread; the detector keeps the
//! most recent tracked hands and projects them into the requested frame on each
//! `estimate_hands`.  Leap reports millimetres above the device with `y` up, so
//! the interaction box below is mapped onto the frame with `y` flipped.
//!
//! Requires the LeapC shared library installed on the system.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use hand_signal::keypoints::KEYPOINT_COUNT;
use hand_signal::{DetectedHand, FrameSize, HandKeypoints, Keypoint};

use crate::clock::CancelToken;
use crate::detector::HandDetector;
use crate::device::VideoFrame;
use crate::error::{DetectError, DeviceError};

// Interaction box, millimetres.
const BOX_X_MIN: f32 = -200.0;
const BOX_X_MAX: f32 =  200.0;
const BOX_Y_MIN: f32 =   80.0;
const BOX_Y_MAX: f32 =  400.0;

const POLL_MS: u32 = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Hand joints in device millimetres, ordered like [`HandKeypoints`].
type RawHand = [(f32, f32); KEYPOINT_COUNT];

struct Tracker {
    cancel: CancelToken,
    hands:  Receiver<Vec<RawHand>>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct LeapHandDetector {
    tracker: Option<Tracker>,
    latest:  Vec<RawHand>,
}

impl LeapHandDetector {
    pub fn new() -> Self {
        LeapHandDetector::default()
    }
}

impl HandDetector for LeapHandDetector {
    fn load(&mut self) -> Result<(), DeviceError> {
        if self.tracker.is_some() { return Ok(()); }

        let cancel = CancelToken::new();
        let (ready_tx, ready_rx) = mpsc::channel();
        let (hands_tx, hands_rx) = mpsc::channel();
        let c2 = cancel.clone();

        let handle = thread::Builder::new()
            .name("leap-poll".to_string())
            .spawn(move || poll_leap(c2, ready_tx, hands_tx))
            .map_err(|e| DeviceError::new("LeapError", e.to_string()))?;

        match ready_rx.recv_timeout(CONNECT_TIMEOUT) {
            Ok(Ok(())) => {
                info!("LeapMotion connection open");
                self.tracker = Some(Tracker { cancel, hands: hands_rx, handle });
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                cancel.cancel();
                Err(DeviceError::new("TimeoutError", "LeapMotion service did not answer"))
            }
        }
    }

    fn estimate_hands(&mut self, frame: &VideoFrame) -> Result<Vec<DetectedHand>, DetectError> {
        let Some(tracker) = &self.tracker else {
            return Err(DetectError::Estimate("leap detector not loaded".to_string()));
        };
        loop {
            match tracker.hands.try_recv() {
                Ok(hands) => self.latest = hands,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(DetectError::Estimate("leap polling thread ended".to_string()));
                }
            }
        }
        Ok(self.latest.iter().map(|raw| project(raw, frame.size)).collect())
    }

    fn dispose(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.cancel.cancel();
            if tracker.handle.join().is_err() {
                warn!("leap polling thread panicked");
            }
            debug!("LeapMotion connection closed");
        }
        self.latest.clear();
    }
}

/// Millimetres → pixels.
fn project(raw: &RawHand, size: FrameSize) -> DetectedHand {
    let (w, h) = (size.width as f32, size.height as f32);
    let mut kp = HandKeypoints::default();
    for (i, &(x, y)) in raw.iter().enumerate() {
        let nx = (x - BOX_X_MIN) / (BOX_X_MAX - BOX_X_MIN);
        let ny = 1.0 - (y - BOX_Y_MIN) / (BOX_Y_MAX - BOX_Y_MIN);
        kp.set(i, Keypoint::new(nx * w, ny * h));
    }
    // Leap hands carry no per-hand score.
    DetectedHand::new(kp, Some(1.0))
}

fn poll_leap(
    cancel: CancelToken,
    ready:  mpsc::Sender<Result<(), DeviceError>>,
    hands:  mpsc::Sender<Vec<RawHand>>,
) {
    use leaprs::*;

    let leap_err = |e: &dyn std::fmt::Debug| DeviceError::new("LeapError", format!("{e:?}"));

    let mut connection = match Connection::create(ConnectionConfig::default()) {
        Ok(c)  => c,
        Err(e) => { let _ = ready.send(Err(leap_err(&e))); return; }
    };
    if let Err(e) = connection.open() {
        let _ = ready.send(Err(leap_err(&e)));
        return;
    }
    if ready.send(Ok(())).is_err() { return; }

    while !cancel.is_cancelled() {
        let msg = match connection.poll(POLL_MS) {
            Ok(m)  => m,
            Err(_) => continue,
        };
        if let Event::Tracking(frame) = msg.event() {
            let raw: Vec<RawHand> = frame.hands().map(|hand| {
                let mut out = [(0.0, 0.0); KEYPOINT_COUNT];
                let wrist = hand.arm().next_joint();
                out[0] = (wrist.x, wrist.y);
                for (d, digit) in hand.digits().enumerate().take(5) {
                    let joints = [
                        digit.proximal().prev_joint(),
                        digit.intermediate().prev_joint(),
                        digit.distal().prev_joint(),
                        digit.distal().next_joint(),
                    ];
                    for (j, p) in joints.iter().enumerate() {
                        out[1 + d * 4 + j] = (p.x, p.y);
                    }
                }
                out
            }).collect();
            if hands.send(raw).is_err() { break; }
        }
    }
}
