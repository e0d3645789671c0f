//! Error types and the capture-error classifier.
//!
//! Camera hosts report failures as a `(name, message)` pair: DOMException
//! names in a browser, errno names on a native V4L host.  [`classify`] maps
//! those onto the small [`ErrorKind`] taxonomy `initialize` reports, through a
//! single name table followed by a single message-keyword table.

use std::fmt;

use hand_signal::KeypointCountError;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// ErrorKind
// ════════════════════════════════════════════════════════════════════════════

/// What went wrong while acquiring the camera, at the level a user can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The host exposes no media-capture API at all.
    UnsupportedBrowser,
    PermissionDenied,
    NoCameraFound,
    /// Another application holds the device.
    CameraInUse,
    /// The device cannot satisfy the requested resolution / facing mode.
    Overconstrained,
    /// Capture is blocked because the page is not served over HTTPS.
    InsecureContext,
    /// The stream never signalled readiness within the configured bound.
    Timeout,
    Unknown,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedBrowser => "unsupported browser",
            ErrorKind::PermissionDenied   => "permission denied",
            ErrorKind::NoCameraFound      => "no camera found",
            ErrorKind::CameraInUse        => "camera in use",
            ErrorKind::Overconstrained    => "camera overconstrained",
            ErrorKind::InsecureContext    => "insecure context",
            ErrorKind::Timeout            => "timeout",
            ErrorKind::Unknown            => "unknown",
        }
    }

    /// User-facing guidance for this failure.
    pub fn remediation(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedBrowser =>
                "Camera access is not supported here. Use a modern browser such as Chrome, Firefox or Edge.",
            ErrorKind::PermissionDenied =>
                "Camera permission denied. Allow camera access in your browser or system settings and try again.",
            ErrorKind::NoCameraFound =>
                "No camera found. Connect a camera and try again.",
            ErrorKind::CameraInUse =>
                "The camera is already in use by another application. Close other apps using the camera.",
            ErrorKind::Overconstrained =>
                "The camera does not meet the required specifications.",
            ErrorKind::InsecureContext =>
                "Camera access is blocked by security settings. Make sure the site is served over HTTPS.",
            ErrorKind::Timeout =>
                "The camera did not start in time. Try again.",
            ErrorKind::Unknown =>
                "Failed to initialize the camera. Check your settings and try again.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error types
// ════════════════════════════════════════════════════════════════════════════

/// Low-level failure reported by a camera host or detector backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct DeviceError {
    /// Machine-readable identifier, e.g. `NotAllowedError` or `EBUSY`.
    pub name:    String,
    pub message: String,
}

impl DeviceError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        DeviceError { name: name.into(), message: message.into() }
    }
}

/// Classified failure returned by `GestureSession::initialize`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct CaptureError {
    pub kind:   ErrorKind,
    pub detail: String,
}

impl CaptureError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        CaptureError { kind, detail: detail.into() }
    }

    pub fn remediation(&self) -> &'static str {
        self.kind.remediation()
    }
}

impl From<DeviceError> for CaptureError {
    fn from(err: DeviceError) -> Self {
        CaptureError { kind: classify(&err), detail: err.to_string() }
    }
}

/// Failure of a single detection step.  Never fatal to the session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("frame capture failed: {0}")]
    Frame(#[from] DeviceError),

    #[error("hand estimation failed: {0}")]
    Estimate(String),

    #[error("malformed detector output: {0}")]
    Keypoints(#[from] KeypointCountError),
}

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Exact error-name matches, checked first.
const NAME_TABLE: &[(&str, ErrorKind)] = &[
    ("NotAllowedError",             ErrorKind::PermissionDenied),
    ("PermissionDeniedError",       ErrorKind::PermissionDenied),
    ("EACCES",                      ErrorKind::PermissionDenied),
    ("EPERM",                       ErrorKind::PermissionDenied),
    ("NotFoundError",               ErrorKind::NoCameraFound),
    ("DevicesNotFoundError",        ErrorKind::NoCameraFound),
    ("ENOENT",                      ErrorKind::NoCameraFound),
    ("ENODEV",                      ErrorKind::NoCameraFound),
    ("NotReadableError",            ErrorKind::CameraInUse),
    ("TrackStartError",             ErrorKind::CameraInUse),
    ("EBUSY",                       ErrorKind::CameraInUse),
    ("OverconstrainedError",        ErrorKind::Overconstrained),
    ("ConstraintNotSatisfiedError", ErrorKind::Overconstrained),
    ("SecurityError",               ErrorKind::InsecureContext),
    ("TimeoutError",                ErrorKind::Timeout),
    ("NotSupportedError",           ErrorKind::UnsupportedBrowser),
];

/// Lower-case message keywords, checked in order when the name is unknown.
const MESSAGE_TABLE: &[(&str, ErrorKind)] = &[
    ("permission",       ErrorKind::PermissionDenied),
    ("not allowed",      ErrorKind::PermissionDenied),
    ("secure context",   ErrorKind::InsecureContext),
    ("https",            ErrorKind::InsecureContext),
    ("in use",           ErrorKind::CameraInUse),
    ("busy",             ErrorKind::CameraInUse),
    ("no camera",        ErrorKind::NoCameraFound),
    ("no such device",   ErrorKind::NoCameraFound),
    ("not found",        ErrorKind::NoCameraFound),
    ("constraint",       ErrorKind::Overconstrained),
    ("timed out",        ErrorKind::Timeout),
    ("timeout",          ErrorKind::Timeout),
    ("not supported",    ErrorKind::UnsupportedBrowser),
];

/// Map a host error onto exactly one [`ErrorKind`].  Deterministic; falls back
/// to [`ErrorKind::Unknown`].
pub fn classify(err: &DeviceError) -> ErrorKind {
    if let Some(&(_, kind)) = NAME_TABLE.iter().find(|(name, _)| *name == err.name) {
        return kind;
    }
    let message = err.message.to_lowercase();
    MESSAGE_TABLE
        .iter()
        .find(|(keyword, _)| message.contains(keyword))
        .map(|&(_, kind)| kind)
        .unwrap_or(ErrorKind::Unknown)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
