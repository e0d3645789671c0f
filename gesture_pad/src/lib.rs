//! # gesture_pad
//!
//! Interactive debug pad for the gesture pipeline.  A [`GestureSession`] runs
//! against the simulated camera; the hand it "sees" is synthesized from the
//! mouse, so every rule of the signal processor can be exercised without a
//! camera.  The window shows the same overlay a game would draw on top of
//! its mirrored camera preview.
//!
//! ## Mouse / keyboard → hand
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse position | Palm center (mirrored view) |
//! | `0`–`5` | Number of raised fingers |
//! | `H` | Toggle hand visible / lost |
//! | `C` | Calibrate: current hand x becomes the neutral center |
//! | `M` | Toggle mirrored view |
//! | `Q` / `Escape` | Quit |
//!
//! ## Overlay
//!
//! Left / dead / right zone bands from the live calibration, a ring at the
//! palm (green open, red closed), an arrow when moving, and the status lines
//! (detection, direction, palm, height, fingers with power-up slot,
//! confidence).
//!
//! ## Feature flags
//!
//! * (default) — mouse-driven synthetic hand.
//! * `leap` — hands come from a LeapMotion controller; the mouse is ignored.
//!
//! [`GestureSession`]: gesture_session::GestureSession

pub mod pointer;
pub mod overlay;
pub mod app;
