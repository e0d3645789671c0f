//! In-memory camera host.
//!
//! `SimDevices` is configured builder-style with the failure it should
//! produce, then handed to a session.  `DeviceCounters` stays with the caller
//! so tests can check what was opened and released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use hand_signal::FrameSize;

use crate::device::{CaptureConstraints, MediaDevices, PermissionState, VideoFrame, VideoStream};
use crate::error::DeviceError;

// ════════════════════════════════════════════════════════════════════════════
// DeviceCounters
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct DeviceCounters {
    opens: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
}

impl DeviceCounters {
    /// Successful `open` calls.
    pub fn opens(&self) -> usize { self.opens.load(Ordering::SeqCst) }

    /// Streams stopped.  A stream stopped twice counts once.
    pub fn stops(&self) -> usize { self.stops.load(Ordering::SeqCst) }

    pub fn grabs(&self) -> usize { self.grabs.load(Ordering::SeqCst) }

    /// Streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize { self.opens() - self.stops() }
}

// ════════════════════════════════════════════════════════════════════════════
// SimDevices
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum Readiness {
    /// Ready after this many `poll_ready` calls returned false.
    After(u32),
    Never,
    Fail(DeviceError),
}

pub struct SimDevices {
    supported:  bool,
    permission: PermissionState,
    open_error: Option<DeviceError>,
    readiness:  Readiness,
    size:       Option<FrameSize>,
    grab_error: Arc<Mutex<Option<DeviceError>>>,
    counters:   DeviceCounters,
}

impl Default for SimDevices {
    fn default() -> Self {
        SimDevices::new()
    }
}

impl SimDevices {
    /// A working camera that is ready immediately.
    pub fn new() -> Self {
        SimDevices {
            supported:  true,
            permission: PermissionState::Granted,
            open_error: None,
            readiness:  Readiness::After(0),
            size:       None,
            grab_error: Arc::new(Mutex::new(None)),
            counters:   DeviceCounters::default(),
        }
    }

    /// A host with no capture API.
    pub fn unsupported() -> Self {
        SimDevices { supported: false, ..SimDevices::new() }
    }

    pub fn with_permission(mut self, permission: PermissionState) -> Self {
        self.permission = permission;
        self
    }

    pub fn failing_open(mut self, err: DeviceError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn never_ready(mut self) -> Self {
        self.readiness = Readiness::Never;
        self
    }

    pub fn ready_after(mut self, polls: u32) -> Self {
        self.readiness = Readiness::After(polls);
        self
    }

    pub fn failing_ready(mut self, err: DeviceError) -> Self {
        self.readiness = Readiness::Fail(err);
        self
    }

    /// Frame size the stream reports.  Defaults to the requested ideal size.
    pub fn with_frame_size(mut self, size: FrameSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn counters(&self) -> DeviceCounters {
        self.counters.clone()
    }

    /// Switch for making `grab_frame` fail on every stream from this host.
    /// `Some(err)` fails every grab until set back to `None`.
    pub fn grab_fault(&self) -> GrabFault {
        GrabFault(self.grab_error.clone())
    }
}

/// Handle returned by [`SimDevices::grab_fault`].
#[derive(Clone)]
pub struct GrabFault(Arc<Mutex<Option<DeviceError>>>);

impl GrabFault {
    pub fn set(&self, err: Option<DeviceError>) {
        *self.0.lock() = err;
    }
}

impl MediaDevices for SimDevices {
    fn is_supported(&self) -> bool { self.supported }

    fn permission(&self) -> PermissionState { self.permission }

    fn open(&mut self, constraints: &CaptureConstraints) -> Result<Box<dyn VideoStream>, DeviceError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        let size = self
            .size
            .unwrap_or_else(|| FrameSize::new(constraints.ideal_width, constraints.ideal_height));
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        debug!(width = size.width, height = size.height, "sim camera opened");
        Ok(Box::new(SimStream {
            size,
            readiness:  self.readiness.clone(),
            sequence:   0,
            stopped:    false,
            grab_error: self.grab_error.clone(),
            counters:   self.counters.clone(),
        }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimStream
// ════════════════════════════════════════════════════════════════════════════

pub struct SimStream {
    size:       FrameSize,
    readiness:  Readiness,
    sequence:   u64,
    stopped:    bool,
    grab_error: Arc<Mutex<Option<DeviceError>>>,
    counters:   DeviceCounters,
}

impl VideoStream for SimStream {
    fn poll_ready(&mut self) -> Result<bool, DeviceError> {
        match &mut self.readiness {
            Readiness::After(0)  => Ok(true),
            Readiness::After(n)  => { *n -= 1; Ok(false) }
            Readiness::Never     => Ok(false),
            Readiness::Fail(err) => Err(err.clone()),
        }
    }

    fn frame_size(&self) -> FrameSize { self.size }

    fn grab_frame(&mut self) -> Result<VideoFrame, DeviceError> {
        if self.stopped {
            return Err(DeviceError::new("InvalidStateError", "stream is stopped"));
        }
        if let Some(err) = self.grab_error.lock().clone() {
            return Err(err);
        }
        self.counters.grabs.fetch_add(1, Ordering::SeqCst);
        self.sequence += 1;
        Ok(VideoFrame::blank(self.size, self.sequence))
    }

    fn stop(&mut self) {
        if self.stopped { return; }
        self.stopped = true;
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        debug!("sim camera stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_size_follows_constraints() {
        let mut devices = SimDevices::new();
        let c = CaptureConstraints { ideal_width: 1280, ideal_height: 720, ..Default::default() };
        let stream = devices.open(&c).unwrap();
        assert_eq!(stream.frame_size(), FrameSize::new(1280, 720));
    }

    #[test]
    fn ready_after_counts_polls() {
        let mut devices = SimDevices::new().ready_after(2);
        let mut stream = devices.open(&CaptureConstraints::default()).unwrap();
        assert!(!stream.poll_ready().unwrap());
        assert!(!stream.poll_ready().unwrap());
        assert!(stream.poll_ready().unwrap());
    }

    #[test]
    fn stop_is_counted_once() {
        let mut devices = SimDevices::new();
        let counters = devices.counters();
        let mut stream = devices.open(&CaptureConstraints::default()).unwrap();
        assert_eq!(counters.live_streams(), 1);
        stream.stop();
        stream.stop();
        assert_eq!(counters.stops(), 1);
        assert_eq!(counters.live_streams(), 0);
        assert!(stream.grab_frame().is_err());
    }

    #[test]
    fn frames_are_sequenced() {
        let mut devices = SimDevices::new();
        let mut stream = devices.open(&CaptureConstraints::default()).unwrap();
        assert_eq!(stream.grab_frame().unwrap().sequence, 1);
        assert_eq!(stream.grab_frame().unwrap().sequence, 2);
        assert_eq!(devices.counters().grabs(), 2);
    }

    #[test]
    fn grab_fault_toggles() {
        let mut devices = SimDevices::new();
        let fault = devices.grab_fault();
        let mut stream = devices.open(&CaptureConstraints::default()).unwrap();
        fault.set(Some(DeviceError::new("AbortError", "track ended")));
        assert!(stream.grab_frame().is_err());
        fault.set(None);
        assert!(stream.grab_frame().is_ok());
    }
}
