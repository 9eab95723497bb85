use serde::{Deserialize, Serialize};

/// Progress remapping curves. All are monotonic with `ease(0) = 0` and
/// `ease(1) = 1`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    EaseInOutCubic,
    EaseOutQuart,
    #[default]
    EaseOutExpo,
}

impl Easing {
    /// `t` is clamped to [0, 1] before remapping.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseOutQuart => "easeOutQuart",
            Easing::EaseOutExpo => "easeOutExpo",
        }
    }
}
