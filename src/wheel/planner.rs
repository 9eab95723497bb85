use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::segments::{normalize_degrees, FULL_TURN};

/// Inclusive range of extra full turns added before landing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraTurns {
    pub min: u32,
    pub max: u32,
}

impl Default for ExtraTurns {
    fn default() -> Self {
        Self { min: 4, max: 6 }
    }
}

impl ExtraTurns {
    /// `min + floor(r * (max - min + 1))`, capped at `max`.
    pub fn draw(&self, rng: &mut RandomSource) -> u32 {
        let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
        let span = f64::from(hi - lo + 1);
        let offset = (rng.next() * span).floor() as u32;
        (lo + offset).min(hi)
    }
}

/// Rotation that brings a sector's mid-angle under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPlan {
    pub start_angle: f64,
    pub target_angle: f64,
    pub extra_turns: u32,
}

impl RotationPlan {
    pub fn delta(&self) -> f64 {
        self.target_angle - self.start_angle
    }
}

/// Angle (mod 360) at which the wheel shows `mid_angle` under the pointer.
pub fn landing_angle(mid_angle: f64) -> f64 {
    normalize_degrees(-mid_angle)
}

/// Plans a forward rotation from `current` so that `mid_angle` ends at 0°.
///
/// `extra_turns` must be at least 1 for the rotation to be strictly forward
/// when the sector already sits under the pointer.
pub fn plan_rotation(current: f64, mid_angle: f64, extra_turns: u32) -> RotationPlan {
    let desired = landing_angle(mid_angle);
    let delta = normalize_degrees(desired - current) + f64::from(extra_turns) * FULL_TURN;
    RotationPlan {
        start_angle: current,
        target_angle: current + delta,
        extra_turns,
    }
}
