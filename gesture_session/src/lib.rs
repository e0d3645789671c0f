//! gesture_session — turns a camera and a hand-pose detector into a steady
//! stream of [`GestureState`]s.
//!
//! A [`GestureSession`] acquires the camera and loads the detector
//! (`initialize`), then runs a per-frame loop on its own thread
//! (`start_detection`) that feeds the first detected hand through
//! [`hand_signal::compute_gesture_state`] and publishes the result.  Game code
//! polls [`GestureSession::gesture_state`] whenever it likes; the call never
//! blocks on detection.
//!
//! ```text
//!   MediaDevices ──open──▶ VideoStream ──grab_frame──┐
//!                                                    ▼
//!   FrameClock ──next_frame──▶ DetectionLoop ──▶ HandDetector
//!                                    │
//!                                    ▼  compute_gesture_state
//!                          Arc<Shared { gesture, calibration, frame }>
//!                                    ▲
//!   GestureSession::gesture_state ───┘
//! ```
//!
//! The camera host and the detector are traits so the session runs the same
//! way against real hardware, the LeapMotion backend (`leap` feature) or the
//! in-memory [`sim`] collaborators.

pub mod clock;
pub mod config;
mod detection;
pub mod detector;
pub mod device;
pub mod error;
pub mod session;
pub mod sim;

#[cfg(feature = "leap")]
pub mod leap;

pub use clock::{stepped_clock, CancelToken, FrameClock, FrameStepper, IntervalClock, SteppedClock};
pub use config::SessionConfig;
pub use detector::HandDetector;
pub use device::{
    CaptureConstraints, FacingMode, MediaDevices, PermissionState, VideoFrame, VideoStream,
};
pub use error::{classify, CaptureError, DetectError, DeviceError, ErrorKind};
pub use session::{GestureSession, SessionState};

pub use hand_signal::{Calibration, GestureState, HandHeight, MoveDirection};
