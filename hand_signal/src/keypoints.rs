//! Hand keypoints in the standard 21-point topology.

use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Number of keypoints in one hand.
pub const KEYPOINT_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Keypoint / HandKeypoints
// ════════════════════════════════════════════════════════════════════════════

/// One tracked landmark, in pixels.  `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Keypoint { x, y }
    }
}

/// Exactly 21 keypoints.  Building one from detector output is the only place
/// the count is checked; after that indexing cannot go out of range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandKeypoints(pub [Keypoint; KEYPOINT_COUNT]);

impl HandKeypoints {
    pub fn get(&self, index: usize) -> Keypoint {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, point: Keypoint) {
        self.0[index] = point;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint> {
        self.0.iter()
    }
}

impl Default for HandKeypoints {
    fn default() -> Self {
        HandKeypoints([Keypoint::default(); KEYPOINT_COUNT])
    }
}

/// Detector output did not have 21 keypoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeypointCountError {
    pub received: usize,
}

impl fmt::Display for KeypointCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} hand keypoints, got {}", KEYPOINT_COUNT, self.received)
    }
}

impl std::error::Error for KeypointCountError {}

impl TryFrom<&[Keypoint]> for HandKeypoints {
    type Error = KeypointCountError;

    fn try_from(points: &[Keypoint]) -> Result<Self, Self::Error> {
        let arr: [Keypoint; KEYPOINT_COUNT] = points
            .try_into()
            .map_err(|_| KeypointCountError { received: points.len() })?;
        Ok(HandKeypoints(arr))
    }
}

impl TryFrom<Vec<Keypoint>> for HandKeypoints {
    type Error = KeypointCountError;

    fn try_from(points: Vec<Keypoint>) -> Result<Self, Self::Error> {
        HandKeypoints::try_from(points.as_slice())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectedHand / FrameSize
// ════════════════════════════════════════════════════════════════════════════

/// One hand as reported by the pose detector.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedHand {
    pub keypoints: HandKeypoints,
    /// Detector confidence in [0, 1], if the detector reports one.
    pub score: Option<f32>,
}

impl DetectedHand {
    pub fn new(keypoints: HandKeypoints, score: Option<f32>) -> Self {
        DetectedHand { keypoints, score }
    }
}

/// Video frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width:  u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        FrameSize { width, height }
    }
}

impl Default for FrameSize {
    /// 640×480, the capture size the finger thresholds are tuned for.
    fn default() -> Self {
        FrameSize::new(640, 480)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_from_accepts_exactly_21() {
        let pts = vec![Keypoint::new(1.0, 2.0); KEYPOINT_COUNT];
        let hand = HandKeypoints::try_from(pts).unwrap();
        assert_eq!(hand.get(PINKY_TIP), Keypoint::new(1.0, 2.0));
    }

    #[test]
    fn try_from_rejects_short_input() {
        let pts = vec![Keypoint::default(); 5];
        let err = HandKeypoints::try_from(pts.as_slice()).unwrap_err();
        assert_eq!(err.received, 5);
        assert_eq!(err.to_string(), "expected 21 hand keypoints, got 5");
    }

    #[test]
    fn try_from_rejects_long_input() {
        let pts = vec![Keypoint::default(); 42];
        assert!(HandKeypoints::try_from(pts).is_err());
    }
}
