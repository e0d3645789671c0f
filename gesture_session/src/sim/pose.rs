//! Synthetic hand poses.
//!
//! `pose_hand` lays out a plausible upright right hand around a palm center,
//! with each finger either raised or curled.  The palm center of the result
//! (mean of wrist, index MCP, pinky MCP) is exactly `palm`.

use hand_signal::keypoints::*;

/// Vertical distance from MCP to PIP joint.
const PIP_RISE: f32 = 25.0;
/// Tip height above the MCP for a raised / curled finger.
const TIP_RAISED: f32 = 60.0;
const TIP_CURLED: f32 = 10.0;

/// `extended` is `[thumb, index, middle, ring, pinky]`.
pub fn pose_hand(palm: Keypoint, extended: [bool; 5]) -> HandKeypoints {
    let (px, py) = (palm.x, palm.y);
    let at = |dx: f32, dy: f32| Keypoint::new(px + dx, py + dy);
    let mut kp = HandKeypoints::default();

    kp.set(WRIST, at(0.0, 40.0));

    // Thumb sticks out sideways when extended.
    kp.set(THUMB_CMC, at(-30.0, 25.0));
    kp.set(THUMB_MCP, at(-45.0, 10.0));
    if extended[0] {
        kp.set(THUMB_IP,  at(-70.0, 2.0));
        kp.set(THUMB_TIP, at(-95.0, -5.0));
    } else {
        kp.set(THUMB_IP,  at(-45.0, 2.0));
        kp.set(THUMB_TIP, at(-40.0, 0.0));
    }

    let fingers = [
        (INDEX_MCP,  -20.0, -20.0),
        (MIDDLE_MCP,  -7.0, -25.0),
        (RING_MCP,     7.0, -25.0),
        (PINKY_MCP,   20.0, -20.0),
    ];
    for (i, &(mcp, dx, dy)) in fingers.iter().enumerate() {
        let tip_rise = if extended[i + 1] { TIP_RAISED } else { TIP_CURLED };
        let dip_rise = if extended[i + 1] { 45.0 } else { 20.0 };
        kp.set(mcp,     at(dx, dy));
        kp.set(mcp + 1, at(dx, dy - PIP_RISE));
        kp.set(mcp + 2, at(dx, dy - dip_rise));
        kp.set(mcp + 3, at(dx, dy - tip_rise));
    }
    kp
}

/// The first `n` fingers raised, counting index, middle, ring, pinky, thumb.
pub fn fingers_up(n: u8) -> [bool; 5] {
    let n = n.min(5);
    [
        n >= 5,
        n >= 1,
        n >= 2,
        n >= 3,
        n >= 4,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_signal::processor::{count_extended_fingers, palm_center};

    #[test]
    fn palm_center_is_preserved() {
        let kp = pose_hand(Keypoint::new(123.0, 321.0), fingers_up(3));
        let c = palm_center(&kp);
        assert!((c.x - 123.0).abs() < 1e-4);
        assert!((c.y - 321.0).abs() < 1e-4);
    }

    #[test]
    fn finger_count_matches_request() {
        for n in 0..=5u8 {
            let kp = pose_hand(Keypoint::new(320.0, 240.0), fingers_up(n));
            assert_eq!(count_extended_fingers(&kp), n, "n = {n}");
        }
    }

    #[test]
    fn thumb_alone() {
        let kp = pose_hand(Keypoint::new(320.0, 240.0), [true, false, false, false, false]);
        assert_eq!(count_extended_fingers(&kp), 1);
    }

    #[test]
    fn fingers_up_saturates() {
        assert_eq!(fingers_up(9), [true; 5]);
        assert_eq!(fingers_up(0), [false; 5]);
    }
}
