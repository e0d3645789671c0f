//! [`GestureState`], the per-frame control record consumers poll.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Discrete signals
// ════════════════════════════════════════════════════════════════════════════

/// Lateral hand position relative to the calibrated center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Left,
    Right,
    #[default]
    Center,
}

impl MoveDirection {
    pub fn name(self) -> &'static str {
        match self {
            MoveDirection::Left   => "left",
            MoveDirection::Right  => "right",
            MoveDirection::Center => "center",
        }
    }
}

/// Vertical hand position, banded at thirds of the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandHeight {
    High,
    #[default]
    Middle,
    Low,
}

impl HandHeight {
    pub fn name(self) -> &'static str {
        match self {
            HandHeight::High   => "high",
            HandHeight::Middle => "middle",
            HandHeight::Low    => "low",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// Summary of one processed frame.
///
/// When `is_hand_detected` is false, `confidence` is 0 and every other field
/// still holds the last detected value.  Check `is_hand_detected` before
/// acting on direction or finger data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureState {
    pub move_direction:   MoveDirection,
    pub is_palm_open:     bool,
    pub hand_height:      HandHeight,
    /// Palm center, normalized to frame width.  Not clamped.
    pub hand_x:           f32,
    /// Palm center, normalized to frame height.  Not clamped.
    pub hand_y:           f32,
    pub is_hand_detected: bool,
    pub confidence:       f32,
    pub fingers_extended: u8,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState {
            move_direction:   MoveDirection::Center,
            is_palm_open:     false,
            hand_height:      HandHeight::Middle,
            hand_x:           0.5,
            hand_y:           0.5,
            is_hand_detected: false,
            confidence:       0.0,
            fingers_extended: 0,
        }
    }
}

impl GestureState {
    /// The state to publish for a frame in which no hand was found: detection
    /// off, confidence zero, everything else frozen at the last known values.
    pub fn without_hand(&self) -> GestureState {
        GestureState {
            is_hand_detected: false,
            confidence:       0.0,
            ..*self
        }
    }

    /// Power-up slot selected by holding up one to three fingers.
    pub fn power_up_slot(&self) -> Option<u8> {
        if self.is_hand_detected && (1..=3).contains(&self.fingers_extended) {
            Some(self.fingers_extended)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected() -> GestureState {
        GestureState {
            move_direction:   MoveDirection::Left,
            is_palm_open:     true,
            hand_height:      HandHeight::High,
            hand_x:           0.1,
            hand_y:           0.2,
            is_hand_detected: true,
            confidence:       0.93,
            fingers_extended: 4,
        }
    }

    #[test]
    fn default_is_centered_and_undetected() {
        let s = GestureState::default();
        assert_eq!(s.move_direction, MoveDirection::Center);
        assert_eq!(s.hand_height, HandHeight::Middle);
        assert!(!s.is_hand_detected);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.fingers_extended, 0);
    }

    #[test]
    fn without_hand_keeps_stale_fields() {
        let s = detected();
        let lost = s.without_hand();
        assert!(!lost.is_hand_detected);
        assert_eq!(lost.confidence, 0.0);
        assert_eq!(lost.move_direction, s.move_direction);
        assert_eq!(lost.hand_height, s.hand_height);
        assert_eq!(lost.fingers_extended, s.fingers_extended);
        assert_eq!(lost.is_palm_open, s.is_palm_open);
        assert_eq!(lost.hand_x, s.hand_x);
    }

    #[test]
    fn power_up_slot_only_for_one_to_three() {
        let mut s = detected();
        for (n, want) in [(0, None), (1, Some(1)), (2, Some(2)), (3, Some(3)), (4, None), (5, None)] {
            s.fingers_extended = n;
            assert_eq!(s.power_up_slot(), want, "fingers={n}");
        }
        s.fingers_extended = 2;
        assert_eq!(s.without_hand().power_up_slot(), None);
    }

    #[test]
    fn json_field_names() {
        let json = serde_json::to_value(detected()).unwrap();
        assert_eq!(json["moveDirection"], "left");
        assert_eq!(json["handHeight"], "high");
        assert_eq!(json["fingersExtended"], 4);
        assert_eq!(json["isHandDetected"], true);
    }
}
