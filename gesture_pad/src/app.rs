//! Pad state and the two run modes.
//!
//! [`Pad`] owns a [`GestureSession`] wired to the simulated camera and a
//! stepped clock: every rendered frame presents exactly one detection frame,
//! so what the overlay shows is always the state computed for the pointer
//! position of that same frame.

use std::io::Write;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};
use serde_json::json;
use tracing::{info, warn};

use gesture_session::sim::{DetectorScript, ScriptedDetector, SimDevices};
use gesture_session::{stepped_clock, CaptureError, FrameStepper, GestureSession, SessionConfig};
use hand_signal::{FrameSize, GestureState};

use crate::overlay::{draw_overlay, Canvas, BACKGROUND};
use crate::pointer::PointerHand;

// ════════════════════════════════════════════════════════════════════════════
// PadConfig
// ════════════════════════════════════════════════════════════════════════════

pub struct PadConfig {
    pub session:  SessionConfig,
    /// Draw the preview mirrored, like a front-camera selfie view.
    pub mirrored: bool,
}

impl Default for PadConfig {
    fn default() -> Self {
        PadConfig { session: SessionConfig::default(), mirrored: true }
    }
}

impl PadConfig {
    fn frame_size(&self) -> FrameSize {
        let c = self.session.constraints;
        FrameSize::new(c.ideal_width, c.ideal_height)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pad
// ════════════════════════════════════════════════════════════════════════════

pub struct Pad {
    session:  GestureSession,
    stepper:  FrameStepper,
    /// `None` when hands come from real hardware.
    script:   Option<DetectorScript>,
    frame:    FrameSize,
    pub mirrored: bool,
    pub pointer:  PointerHand,
}

impl Pad {
    /// Session fed by the pointer.  Initialized and detecting on return.
    pub fn simulated(config: &PadConfig) -> Result<Self, CaptureError> {
        let (detector, script) = ScriptedDetector::new();
        Pad::start(config, detector, Some(script))
    }

    /// Session fed by a LeapMotion controller.
    #[cfg(feature = "leap")]
    pub fn leap(config: &PadConfig) -> Result<Self, CaptureError> {
        Pad::start(config, gesture_session::leap::LeapHandDetector::new(), None)
    }

    fn start(
        config:   &PadConfig,
        detector: impl gesture_session::HandDetector + 'static,
        script:   Option<DetectorScript>,
    ) -> Result<Self, CaptureError> {
        let frame = config.frame_size();
        let (clock, stepper) = stepped_clock();
        let mut session = GestureSession::new(config.session, SimDevices::new(), detector)
            .with_clock(clock);
        session.initialize()?;
        session.start_detection();

        let pointer = PointerHand {
            x: frame.width as f32 / 2.0,
            y: frame.height as f32 / 2.0,
            ..PointerHand::default()
        };
        Ok(Pad { session, stepper, script, frame, mirrored: config.mirrored, pointer })
    }

    pub fn frame_size(&self) -> FrameSize { self.frame }

    pub fn session(&self) -> &GestureSession { &self.session }

    /// Run one detection frame for the current pointer and return the
    /// published state.
    pub fn tick(&mut self) -> GestureState {
        if let Some(script) = &self.script {
            script.set_current(self.pointer.to_detected(self.frame, self.mirrored));
        }
        if !self.stepper.step() {
            warn!("detection frame was not handled in time");
        }
        self.session.gesture_state()
    }

    /// Current hand x becomes the neutral center.
    pub fn calibrate_here(&self) {
        let state = self.session.gesture_state();
        if state.is_hand_detected {
            self.session.calibrate(state.hand_x);
        } else {
            info!("no hand to calibrate on");
        }
    }

    pub fn render(&self, canvas: &mut Canvas, state: &GestureState) {
        canvas.clear(BACKGROUND);
        draw_overlay(canvas, state, &self.session.calibration(), self.mirrored);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Window mode
// ════════════════════════════════════════════════════════════════════════════

const FINGER_KEYS: [(Key, u8); 6] = [
    (Key::Key0, 0), (Key::Key1, 1), (Key::Key2, 2),
    (Key::Key3, 3), (Key::Key4, 4), (Key::Key5, 5),
];

pub fn run_window(config: PadConfig) -> Result<(), String> {
    #[cfg(feature = "leap")]
    let mut pad = Pad::leap(&config).map_err(|e| format!("{e}\n{}", e.remediation()))?;
    #[cfg(not(feature = "leap"))]
    let mut pad = Pad::simulated(&config).map_err(|e| format!("{e}\n{}", e.remediation()))?;

    let size = pad.frame_size();
    let (w, h) = (size.width as usize, size.height as usize);
    let mut window = Window::new(
        "Gesture Pad — hand gesture debug overlay",
        w, h,
        WindowOptions { resize: false, ..WindowOptions::default() },
    ).map_err(|e| e.to_string())?;
    window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

    let mut canvas = Canvas::new(w, h);
    info!(width = w, height = h, "pad window open");

    while window.is_open() {
        let one_shot = |k: Key| window.is_key_pressed(k, KeyRepeat::No);

        if one_shot(Key::Q) || one_shot(Key::Escape) { break; }
        for (key, n) in FINGER_KEYS {
            if one_shot(key) { pad.pointer.fingers = n; }
        }
        if one_shot(Key::H) { pad.pointer.visible = !pad.pointer.visible; }
        if one_shot(Key::M) { pad.mirrored = !pad.mirrored; }
        if one_shot(Key::C) { pad.calibrate_here(); }

        if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Clamp) {
            pad.pointer.x = mx;
            pad.pointer.y = my;
        }

        let state = pad.tick();
        pad.render(&mut canvas, &state);
        window
            .update_with_buffer(canvas.pixels(), w, h)
            .map_err(|e| e.to_string())?;
    }

    info!("pad window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Headless mode
// ════════════════════════════════════════════════════════════════════════════

/// Pointer position and finger count for frame `i` of the headless sweep:
/// a left-to-right pass every 120 frames, bobbing up and down, cycling the
/// finger count every 20 frames and dropping the hand for the last 10 frames
/// of each pass.
pub fn sweep_pointer(i: u64, frame: FrameSize) -> PointerHand {
    let pass = (i % 120) as f32 / 119.0;
    let bob = ((i % 60) as f32 / 59.0 * std::f32::consts::TAU).sin();
    PointerHand {
        x:       pass * frame.width as f32,
        y:       frame.height as f32 * (0.5 + 0.4 * bob),
        fingers: ((i / 20) % 6) as u8,
        visible: i % 120 < 110,
    }
}

/// Run `frames` frames of the sweep without a window, writing one JSON line
/// per frame to `out`.
pub fn run_headless(config: PadConfig, frames: u64, out: &mut impl Write) -> Result<(), String> {
    let mut pad = Pad::simulated(&config).map_err(|e| format!("{e}\n{}", e.remediation()))?;
    let size = pad.frame_size();
    info!(frames, "headless sweep");

    for i in 0..frames {
        pad.pointer = sweep_pointer(i, size);
        let state = pad.tick();
        let line = json!({ "frame": i, "state": state });
        writeln!(out, "{line}").map_err(|e| e.to_string())?;
    }
    out.flush().map_err(|e| e.to_string())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
