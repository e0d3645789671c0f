//! Simulated collaborators: a camera host, a scripted detector and a pose
//! generator.  Used by the tests and by `gesture_pad`, which drives a session
//! from the mouse instead of a camera.

mod camera;
mod detector;
mod pose;

pub use camera::{DeviceCounters, GrabFault, SimDevices, SimStream};
pub use detector::{DetectorScript, ScriptedDetector};
pub use pose::{fingers_up, pose_hand};
