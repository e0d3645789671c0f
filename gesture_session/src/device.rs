//! Camera collaborator traits.
//!
//! The session never touches a real capture API directly; it talks to a
//! [`MediaDevices`] host that hands out [`VideoStream`]s.  `gesture_session::sim`
//! has in-memory implementations.

use std::sync::Arc;

use hand_signal::FrameSize;

use crate::error::DeviceError;

// ════════════════════════════════════════════════════════════════════════════
// Request side
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacingMode {
    /// Front camera, facing the player.
    User,
    Environment,
}

/// What the session asks the camera host for.  Sizes are preferences, not
/// hard requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub ideal_width:  u32,
    pub ideal_height: u32,
    pub facing:       FacingMode,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        CaptureConstraints {
            ideal_width:  640,
            ideal_height: 480,
            facing:       FacingMode::User,
        }
    }
}

/// Result of a permission query made before requesting the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The user will be asked when the stream is requested.
    Prompt,
    /// The host cannot answer; acquisition is attempted anyway.
    Unknown,
}

// ════════════════════════════════════════════════════════════════════════════
// VideoFrame
// ════════════════════════════════════════════════════════════════════════════

/// One captured frame.  Pixels are 0RGB, row-major; a host that only feeds a
/// detector which ignores pixels may leave them empty.  Cloning is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFrame {
    pub size:     FrameSize,
    /// Monotonic per-stream frame counter.
    pub sequence: u64,
    pub pixels:   Arc<[u32]>,
}

impl VideoFrame {
    pub fn new(size: FrameSize, sequence: u64, pixels: Vec<u32>) -> Self {
        VideoFrame { size, sequence, pixels: pixels.into() }
    }

    /// Frame with no pixel data.
    pub fn blank(size: FrameSize, sequence: u64) -> Self {
        VideoFrame::new(size, sequence, Vec::new())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

/// The camera host.
pub trait MediaDevices: Send {
    /// False when no capture API exists at all.
    fn is_supported(&self) -> bool;

    /// Current camera permission, if the host can tell without prompting.
    fn permission(&self) -> PermissionState {
        PermissionState::Unknown
    }

    /// Request a live stream.  May block on a permission prompt.
    fn open(&mut self, constraints: &CaptureConstraints) -> Result<Box<dyn VideoStream>, DeviceError>;
}

/// A live camera stream, owned exclusively by the session.
pub trait VideoStream: Send {
    /// Non-blocking check of the stream-ready signal.  An error means the
    /// stream failed while starting.
    fn poll_ready(&mut self) -> Result<bool, DeviceError>;

    fn frame_size(&self) -> FrameSize;

    /// The most recent frame.
    fn grab_frame(&mut self) -> Result<VideoFrame, DeviceError>;

    /// Stop every track.  Calling it again must be harmless.
    fn stop(&mut self);
}
