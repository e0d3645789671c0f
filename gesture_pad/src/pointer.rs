//! Mouse → synthetic hand.

use gesture_session::sim::{fingers_up, pose_hand};
use hand_signal::{DetectedHand, FrameSize, Keypoint};

/// Detector score reported for the synthetic hand.
pub const POINTER_SCORE: f32 = 0.9;

/// What the pointer is currently "holding up".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerHand {
    /// Palm center in screen pixels.
    pub x:       f32,
    pub y:       f32,
    /// 0–5; index first, thumb last.
    pub fingers: u8,
    pub visible: bool,
}

impl Default for PointerHand {
    fn default() -> Self {
        PointerHand { x: 320.0, y: 240.0, fingers: 0, visible: true }
    }
}

/// Screen x of a mirrored preview back to camera x (and vice versa).
pub fn mirror_x(x: f32, width: u32, mirrored: bool) -> f32 {
    if mirrored { width as f32 - x } else { x }
}

impl PointerHand {
    /// Hand as the camera would see it, or `None` while hidden.
    pub fn to_detected(&self, frame: FrameSize, mirrored: bool) -> Option<DetectedHand> {
        if !self.visible { return None; }
        let palm = Keypoint::new(mirror_x(self.x, frame.width, mirrored), self.y);
        let pose = pose_hand(palm, fingers_up(self.fingers));
        Some(DetectedHand::new(pose, Some(POINTER_SCORE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_signal::processor::{count_extended_fingers, palm_center};

    #[test]
    fn hidden_pointer_has_no_hand() {
        let p = PointerHand { visible: false, ..PointerHand::default() };
        assert!(p.to_detected(FrameSize::default(), true).is_none());
    }

    #[test]
    fn mirrored_pointer_flips_x() {
        let p = PointerHand { x: 100.0, y: 50.0, fingers: 2, visible: true };
        let hand = p.to_detected(FrameSize::new(640, 480), true).unwrap();
        let c = palm_center(&hand.keypoints);
        assert!((c.x - 540.0).abs() < 1e-3);
        assert!((c.y - 50.0).abs() < 1e-3);
        assert_eq!(count_extended_fingers(&hand.keypoints), 2);
        assert_eq!(hand.score, Some(POINTER_SCORE));
    }

    #[test]
    fn unmirrored_pointer_keeps_x() {
        let p = PointerHand { x: 100.0, ..PointerHand::default() };
        let hand = p.to_detected(FrameSize::new(640, 480), false).unwrap();
        assert!((palm_center(&hand.keypoints).x - 100.0).abs() < 1e-3);
    }
}
