//! A hand detector driven by a script instead of a model.
//!
//! Each `estimate_hands` call pops the next queued response; with the queue
//! empty it returns the standing `current` hand (or nothing).  A queued panic
//! stands in for a detector backend that crashes mid-frame.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use hand_signal::DetectedHand;

use crate::detector::HandDetector;
use crate::device::VideoFrame;
use crate::error::{DetectError, DeviceError};

type Response = Result<Vec<DetectedHand>, DetectError>;

enum Scripted {
    Respond(Response),
    Panic(String),
}

#[derive(Default)]
struct ScriptInner {
    queue:      VecDeque<Scripted>,
    current:    Option<DetectedHand>,
    load_error: Option<DeviceError>,
    loads:      usize,
    disposals:  usize,
    calls:      usize,
}

pub struct ScriptedDetector {
    inner: Arc<Mutex<ScriptInner>>,
}

/// Caller-side handle: feeds responses and reads call counts.
#[derive(Clone)]
pub struct DetectorScript {
    inner: Arc<Mutex<ScriptInner>>,
}

impl ScriptedDetector {
    pub fn new() -> (ScriptedDetector, DetectorScript) {
        let inner = Arc::new(Mutex::new(ScriptInner::default()));
        (ScriptedDetector { inner: inner.clone() }, DetectorScript { inner })
    }
}

impl HandDetector for ScriptedDetector {
    fn load(&mut self) -> Result<(), DeviceError> {
        let mut s = self.inner.lock();
        if let Some(err) = s.load_error.clone() {
            return Err(err);
        }
        s.loads += 1;
        Ok(())
    }

    fn estimate_hands(&mut self, _frame: &VideoFrame) -> Result<Vec<DetectedHand>, DetectError> {
        let next = {
            let mut s = self.inner.lock();
            s.calls += 1;
            match s.queue.pop_front() {
                Some(next) => next,
                None       => Scripted::Respond(Ok(s.current.iter().cloned().collect())),
            }
        };
        match next {
            Scripted::Respond(response) => response,
            Scripted::Panic(message)    => panic!("{message}"),
        }
    }

    fn dispose(&mut self) {
        self.inner.lock().disposals += 1;
    }
}

impl DetectorScript {
    pub fn push_hand(&self, hand: DetectedHand) {
        self.push_hands(vec![hand]);
    }

    pub fn push_hands(&self, hands: Vec<DetectedHand>) {
        self.inner.lock().queue.push_back(Scripted::Respond(Ok(hands)));
    }

    pub fn push_no_hand(&self) {
        self.push_hands(Vec::new());
    }

    pub fn push_error(&self, message: &str) {
        self.inner
            .lock()
            .queue
            .push_back(Scripted::Respond(Err(DetectError::Estimate(message.to_string()))));
    }

    /// Make the next `estimate_hands` call panic.
    pub fn push_panic(&self, message: &str) {
        self.inner.lock().queue.push_back(Scripted::Panic(message.to_string()));
    }

    /// Response once the queue runs dry.
    pub fn set_current(&self, hand: Option<DetectedHand>) {
        self.inner.lock().current = hand;
    }

    /// Make every subsequent `load` fail.
    pub fn fail_load(&self, err: DeviceError) {
        self.inner.lock().load_error = Some(err);
    }

    pub fn loads(&self) -> usize { self.inner.lock().loads }

    pub fn disposals(&self) -> usize { self.inner.lock().disposals }

    pub fn calls(&self) -> usize { self.inner.lock().calls }

    /// Responses still queued.
    pub fn pending(&self) -> usize { self.inner.lock().queue.len() }
}
