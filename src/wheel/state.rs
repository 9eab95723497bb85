use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::easing::Easing;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    Landed,
}

/// Whether `reset` keeps the wheel where it stopped or returns it to 0°.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ResetAngle {
    #[default]
    Preserve,
    Zero,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub id: String,
    pub label: String,
    pub index: usize,
}

/// Result of advancing a spin to a frame timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Not spinning; nothing changed.
    Inactive,
    Running { angle: f64, eased: f64 },
    /// The spin reached its duration on this frame and snapped to target.
    Finished { angle: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinState {
    pub phase: SpinPhase,
    pub current_angle: f64,
    pub start_angle: f64,
    pub target_angle: f64,
    /// Host clock reading (ms) when the spin began.
    pub start_time: f64,
    pub duration_ms: f64,
    pub easing: Easing,
    pub extra_turns: u32,
    pub spin_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for SpinState {
    fn default() -> Self {
        Self {
            phase: SpinPhase::Idle,
            current_angle: 0.0,
            start_angle: 0.0,
            target_angle: 0.0,
            start_time: 0.0,
            duration_ms: 0.0,
            easing: Easing::default(),
            extra_turns: 0,
            spin_id: None,
            started_at: None,
        }
    }
}

/// Parameters fixed at the moment a spin begins.
#[derive(Debug, Clone)]
pub struct SpinPlan {
    pub spin_id: String,
    pub target_angle: f64,
    pub extra_turns: u32,
    pub start_time: f64,
    pub duration_ms: f64,
    pub easing: Easing,
    pub started_at: DateTime<Utc>,
}

impl SpinState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spinning(&self) -> bool {
        self.phase == SpinPhase::Spinning
    }

    pub fn begin_spin(&mut self, plan: SpinPlan) {
        *self = Self {
            phase: SpinPhase::Spinning,
            current_angle: self.current_angle,
            start_angle: self.current_angle,
            target_angle: plan.target_angle,
            start_time: plan.start_time,
            duration_ms: plan.duration_ms,
            easing: plan.easing,
            extra_turns: plan.extra_turns,
            spin_id: Some(plan.spin_id),
            started_at: Some(plan.started_at),
        };
    }

    /// Elapsed time for `now`, clamped to [0, duration].
    pub fn elapsed_ms(&self, now: f64) -> f64 {
        let elapsed = now - self.start_time;
        if elapsed.is_nan() {
            0.0
        } else {
            elapsed.clamp(0.0, self.duration_ms)
        }
    }

    /// Moves `current_angle` along the easing curve; on the final frame
    /// snaps to `target_angle` and enters `Landed`.
    pub fn advance(&mut self, now: f64) -> Progress {
        if self.phase != SpinPhase::Spinning {
            return Progress::Inactive;
        }

        let elapsed = self.elapsed_ms(now);
        if elapsed >= self.duration_ms {
            self.land();
            return Progress::Finished {
                angle: self.current_angle,
            };
        }

        let eased = self.easing.apply(elapsed / self.duration_ms);
        let angle = self.start_angle + (self.target_angle - self.start_angle) * eased;
        // Never drift backwards, even if a host hands us an older timestamp.
        self.current_angle = angle.max(self.current_angle);
        Progress::Running {
            angle: self.current_angle,
            eased,
        }
    }

    pub fn land(&mut self) {
        self.current_angle = self.target_angle;
        self.phase = SpinPhase::Landed;
    }

    /// Back to `Idle`, keeping or zeroing the angle.
    pub fn cancel(&mut self, reset_angle: ResetAngle) {
        let current_angle = match reset_angle {
            ResetAngle::Preserve => self.current_angle,
            ResetAngle::Zero => 0.0,
        };
        *self = Self {
            current_angle,
            start_angle: current_angle,
            target_angle: current_angle,
            ..Self::default()
        };
    }
}
