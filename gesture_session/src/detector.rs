//! Hand pose detector collaborator.

use hand_signal::DetectedHand;

use crate::device::VideoFrame;
use crate::error::{DetectError, DeviceError};

/// Anything that can find hands in a video frame.
///
/// `load` runs once per `initialize`; `dispose` once per `cleanup`.  A
/// disposed detector must accept `load` again.
pub trait HandDetector: Send {
    /// Load the model / open the device.  May block.
    fn load(&mut self) -> Result<(), DeviceError>;

    /// Zero or more hands, most confident first.
    fn estimate_hands(&mut self, frame: &VideoFrame) -> Result<Vec<DetectedHand>, DetectError>;

    fn dispose(&mut self);
}
