//! # hand_signal
//!
//! Turns one frame of hand keypoints into a [`GestureState`]: a coarse control
//! signal for a game loop.  Everything here is pure and synchronous; the
//! camera, the detector and the frame loop live in `gesture_session`.
//!
//! ## Signal → control mapping
//!
//! | Signal | Derived from | Typical use |
//! |---|---|---|
//! | `move_direction` | palm-center x vs. calibrated center ± dead zone | steer left / right |
//! | `is_palm_open` | ≥ 3 extended fingers | shoot |
//! | `fingers_extended` | per-digit extension heuristics (0–5) | power-up slot 1–3 |
//! | `hand_height` | palm-center y in thirds of the frame | high / middle / low |
//!
//! ## Keypoint topology
//!
//! 21 points per hand, pixel coordinates in video-frame space:
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19
//!       4    6   10  14  18        PIP joints
//!        3   5    9  13  17        MCP (finger bases)
//!         2
//!          1
//!               0                  wrist
//! ```

pub mod keypoints;
pub mod calibration;
pub mod state;
pub mod processor;

pub use keypoints::{DetectedHand, FrameSize, HandKeypoints, Keypoint, KeypointCountError};
pub use calibration::Calibration;
pub use state::{GestureState, HandHeight, MoveDirection};
pub use processor::compute_gesture_state;
