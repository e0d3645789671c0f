//! Keypoints → [`GestureState`].
//!
//! # Algorithm
//!
//! * **Palm center**: mean of wrist (#0), index base (#5) and pinky base (#17),
//!   divided by frame size to get `hand_x` / `hand_y`.
//! * **Direction**: `rel = hand_x - center_x`; strictly below `-dead_zone` is
//!   left, strictly above `dead_zone` is right, anything else is center.
//! * **Height**: `hand_y < 0.33` high, `< 0.67` middle, otherwise low.
//! * **Thumb**: extended when its tip sits more than `THUMB_SPREAD_PX` further
//!   from the wrist horizontally than its MCP joint does.
//! * **Other fingers**: extended when the tip is at least `FINGER_LIFT_PX`
//!   above (smaller y than) the PIP joint.
//!
//! The pixel thresholds assume a 640×480 capture; they are not rescaled for
//! other resolutions.

use crate::calibration::Calibration;
use crate::keypoints::*;
use crate::state::{GestureState, HandHeight, MoveDirection};

/// Extra horizontal spread (px) the thumb tip needs over the thumb MCP.
pub const THUMB_SPREAD_PX: f32 = 20.0;
/// Minimum lift (px) of a fingertip above its PIP joint.
pub const FINGER_LIFT_PX:  f32 = 10.0;
/// `hand_y` below this is "high".
pub const HIGH_BAND:       f32 = 0.33;
/// `hand_y` below this (and not high) is "middle".
pub const LOW_BAND:        f32 = 0.67;

/// (tip, PIP) pairs for index, middle, ring and pinky.
const FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP,  INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP,   RING_PIP),
    (PINKY_TIP,  PINKY_PIP),
];

// ════════════════════════════════════════════════════════════════════════════
// compute_gesture_state
// ════════════════════════════════════════════════════════════════════════════

/// Full state for a frame in which `hand` was detected.
pub fn compute_gesture_state(
    hand:        &DetectedHand,
    frame:       FrameSize,
    calibration: &Calibration,
) -> GestureState {
    let palm = palm_center(&hand.keypoints);
    let hand_x = palm.x / frame.width as f32;
    let hand_y = palm.y / frame.height as f32;
    let fingers = count_extended_fingers(&hand.keypoints);

    GestureState {
        move_direction:   classify_direction(hand_x, calibration),
        is_palm_open:     fingers >= 3,
        hand_height:      classify_height(hand_y),
        hand_x,
        hand_y,
        is_hand_detected: true,
        confidence:       hand.score.unwrap_or(0.0),
        fingers_extended: fingers,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Building blocks
// ════════════════════════════════════════════════════════════════════════════

/// Mean of wrist, index MCP and pinky MCP, in pixels.
pub fn palm_center(kp: &HandKeypoints) -> Keypoint {
    let w = kp.get(WRIST);
    let i = kp.get(INDEX_MCP);
    let p = kp.get(PINKY_MCP);
    Keypoint::new((w.x + i.x + p.x) / 3.0, (w.y + i.y + p.y) / 3.0)
}

pub fn classify_direction(hand_x: f32, calibration: &Calibration) -> MoveDirection {
    let rel = hand_x - calibration.center_x;
    if rel < -calibration.dead_zone {
        MoveDirection::Left
    } else if rel > calibration.dead_zone {
        MoveDirection::Right
    } else {
        MoveDirection::Center
    }
}

pub fn classify_height(hand_y: f32) -> HandHeight {
    if hand_y < HIGH_BAND {
        HandHeight::High
    } else if hand_y < LOW_BAND {
        HandHeight::Middle
    } else {
        HandHeight::Low
    }
}

/// 0–5.
pub fn count_extended_fingers(kp: &HandKeypoints) -> u8 {
    let thumb = thumb_extended(kp) as u8;
    let others = FINGERS
        .iter()
        .filter(|&&(tip, pip)| kp.get(tip).y < kp.get(pip).y - FINGER_LIFT_PX)
        .count() as u8;
    thumb + others
}

fn thumb_extended(kp: &HandKeypoints) -> bool {
    let wrist = kp.get(WRIST).x;
    let tip_spread = (kp.get(THUMB_TIP).x - wrist).abs();
    let mcp_spread = (kp.get(THUMB_MCP).x - wrist).abs();
    tip_spread > mcp_spread + THUMB_SPREAD_PX
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
