//! Lateral calibration: where "center" is and how wide the dead zone around it is.

use serde::{Deserialize, Serialize};

/// Both values are fractions of frame width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    /// Normalized x the player treats as neutral.
    pub center_x:  f32,
    /// Half-width of the neutral band on each side of `center_x`.
    pub dead_zone: f32,
}

impl Calibration {
    pub const DEFAULT_CENTER_X:  f32 = 0.5;
    pub const DEFAULT_DEAD_ZONE: f32 = 0.15;

    pub fn new(center_x: f32, dead_zone: f32) -> Self {
        Calibration { center_x, dead_zone }
    }

    pub fn with_center(mut self, center_x: f32) -> Self {
        self.center_x = center_x;
        self
    }

    pub fn with_dead_zone(mut self, dead_zone: f32) -> Self {
        self.dead_zone = dead_zone;
        self
    }

    /// Normalized x where the left zone ends and the dead zone begins.
    pub fn left_edge(&self) -> f32 {
        self.center_x - self.dead_zone
    }

    /// Normalized x where the dead zone ends and the right zone begins.
    pub fn right_edge(&self) -> f32 {
        self.center_x + self.dead_zone
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration::new(Self::DEFAULT_CENTER_X, Self::DEFAULT_DEAD_ZONE)
    }
}
