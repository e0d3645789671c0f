//! Frame pacing for the detection loop.
//!
//! The loop runs once per frame the host presents, never on its own timer, so
//! detection cost is bounded by rendering throughput.  A [`FrameClock`] is the
//! host's "next frame" primitive:
//!
//! * [`IntervalClock`]: fixed pacing (~60 fps) for hosts without a render loop.
//! * [`SteppedClock`] + [`FrameStepper`]: the host (a render loop, or a test)
//!   presents frames explicitly, so the loop can be stepped deterministically.
//!
//! Cancellation is cooperative through a shared [`CancelToken`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a waiting clock re-checks its cancel token.
const CANCEL_POLL: Duration = Duration::from_millis(5);

// ════════════════════════════════════════════════════════════════════════════
// CancelToken
// ════════════════════════════════════════════════════════════════════════════

/// Shared stop flag.  Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameClock
// ════════════════════════════════════════════════════════════════════════════

pub trait FrameClock: Send {
    /// Block until the host presents the next frame.  Returns `false` once
    /// `cancel` fires or the host has gone away.
    fn next_frame(&mut self, cancel: &CancelToken) -> bool;

    /// Called after every frame the loop handled, published or not.
    fn frame_done(&mut self) {}

    /// Called when a detection loop starts using this clock.
    fn reset(&mut self) {}
}

// ── IntervalClock ─────────────────────────────────────────────────────────

pub struct IntervalClock {
    period: Duration,
    last:   Option<Instant>,
}

impl IntervalClock {
    pub fn new(period: Duration) -> Self {
        IntervalClock { period, last: None }
    }

    /// ~60 fps.
    pub fn sixty_hz() -> Self {
        IntervalClock::new(Duration::from_millis(16))
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        IntervalClock::sixty_hz()
    }
}

impl FrameClock for IntervalClock {
    fn next_frame(&mut self, cancel: &CancelToken) -> bool {
        let due = match self.last {
            Some(t) => t + self.period,
            None    => Instant::now(),
        };
        loop {
            if cancel.is_cancelled() { return false; }
            let now = Instant::now();
            if now >= due { break; }
            thread::sleep((due - now).min(CANCEL_POLL));
        }
        self.last = Some(Instant::now());
        true
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

// ── SteppedClock / FrameStepper ───────────────────────────────────────────

/// Loop side of a host-driven clock.  Create with [`stepped_clock`].
pub struct SteppedClock {
    frames:  Receiver<u64>,
    done:    Sender<u64>,
    current: Option<u64>,
}

/// Host side of a host-driven clock.  Each presented frame carries a sequence
/// number that comes back once the loop has handled it.
pub struct FrameStepper {
    frames: SyncSender<u64>,
    done:   Receiver<u64>,
    next:   AtomicU64,
}

/// A clock the caller advances by hand.
pub fn stepped_clock() -> (SteppedClock, FrameStepper) {
    let (frame_tx, frame_rx) = mpsc::sync_channel(1);
    let (done_tx, done_rx) = mpsc::channel();
    (
        SteppedClock { frames: frame_rx, done: done_tx, current: None },
        FrameStepper { frames: frame_tx, done: done_rx, next: AtomicU64::new(0) },
    )
}

impl FrameClock for SteppedClock {
    fn next_frame(&mut self, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() { return false; }
            match self.frames.recv_timeout(CANCEL_POLL) {
                Ok(seq)                               => { self.current = Some(seq); return true; }
                Err(RecvTimeoutError::Timeout)        => continue,
                Err(RecvTimeoutError::Disconnected)   => return false,
            }
        }
    }

    fn frame_done(&mut self) {
        if let Some(seq) = self.current.take() {
            let _ = self.done.send(seq);
        }
    }

    /// Frames presented while no loop was running are dropped.
    fn reset(&mut self) {
        while self.frames.try_recv().is_ok() {}
        self.current = None;
    }
}

impl FrameStepper {
    /// Present one frame and wait until the loop has handled it.  Returns
    /// `false` if nothing handled it within one second (detection not running).
    pub fn step(&self) -> bool {
        self.step_timeout(Duration::from_secs(1))
    }

    /// Like [`step`](Self::step) with an explicit bound.  Acks for frames
    /// presented earlier, including ones that timed out, are skipped.
    pub fn step_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;

        loop {
            match self.frames.try_send(seq) {
                Ok(()) => break,
                Err(TrySendError::Full(_)) => {
                    if Instant::now() >= deadline { return false; }
                    thread::sleep(CANCEL_POLL);
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }

        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.done.recv_timeout(left) {
                Ok(acked) if acked >= seq => return true,
                Ok(_)                     => continue,
                Err(_)                    => return false,
            }
        }
    }

    /// Present a frame without waiting.  Dropped if a frame is already
    /// waiting to be picked up.
    pub fn present(&self) {
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.frames.try_send(seq);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_clones_share_state() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn interval_clock_first_frame_is_immediate() {
        let mut clock = IntervalClock::new(Duration::from_secs(60));
        let start = Instant::now();
        assert!(clock.next_frame(&CancelToken::new()));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn interval_clock_paces_frames() {
        let mut clock = IntervalClock::new(Duration::from_millis(20));
        let cancel = CancelToken::new();
        assert!(clock.next_frame(&cancel));
        let start = Instant::now();
        assert!(clock.next_frame(&cancel));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn interval_clock_stops_when_cancelled() {
        let mut clock = IntervalClock::new(Duration::from_secs(60));
        let cancel = CancelToken::new();
        assert!(clock.next_frame(&cancel));
        cancel.cancel();
        let start = Instant::now();
        assert!(!clock.next_frame(&cancel));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn stepped_clock_delivers_presented_frame() {
        let (mut clock, stepper) = stepped_clock();
        stepper.present();
        assert!(clock.next_frame(&CancelToken::new()));
    }

    #[test]
    fn stepped_clock_ends_when_stepper_dropped() {
        let (mut clock, stepper) = stepped_clock();
        drop(stepper);
        assert!(!clock.next_frame(&CancelToken::new()));
    }

    #[test]
    fn stepped_clock_wakes_on_cancel() {
        let (mut clock, _stepper) = stepped_clock();
        let cancel = CancelToken::new();
        let c2 = cancel.clone();
        let waiter = thread::spawn(move || clock.next_frame(&c2));
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn reset_drops_stale_frames() {
        let (mut clock, stepper) = stepped_clock();
        stepper.present();
        clock.reset();
        let cancel = CancelToken::new();
        let c2 = cancel.clone();
        let waiter = thread::spawn(move || clock.next_frame(&c2));
        thread::sleep(Duration::from_millis(20));
        cancel.cancel();
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn step_without_loop_times_out() {
        let (_clock, stepper) = stepped_clock();
        assert!(!stepper.step_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn step_round_trip() {
        let (mut clock, stepper) = stepped_clock();
        let cancel = CancelToken::new();
        let c2 = cancel.clone();
        let worker = thread::spawn(move || {
            let mut frames = 0;
            while clock.next_frame(&c2) {
                frames += 1;
                clock.frame_done();
            }
            frames
        });
        assert!(stepper.step());
        assert!(stepper.step());
        cancel.cancel();
        assert_eq!(worker.join().unwrap(), 2);
    }

    #[test]
    fn late_ack_does_not_satisfy_next_step() {
        let (mut clock, stepper) = stepped_clock();
        let cancel = CancelToken::new();
        let c2 = cancel.clone();
        let handled = Arc::new(AtomicU64::new(0));
        let h2 = handled.clone();
        let worker = thread::spawn(move || {
            let mut first = true;
            while clock.next_frame(&c2) {
                if first {
                    thread::sleep(Duration::from_millis(150));
                    first = false;
                }
                h2.fetch_add(1, Ordering::SeqCst);
                clock.frame_done();
            }
        });

        assert!(!stepper.step_timeout(Duration::from_millis(20)));
        assert!(stepper.step_timeout(Duration::from_secs(2)));
        assert_eq!(handled.load(Ordering::SeqCst), 2);

        cancel.cancel();
        worker.join().unwrap();
    }
}
