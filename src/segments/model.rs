use serde::{Deserialize, Serialize};

/// Weight substituted for any non-positive or non-finite segment weight.
pub const MIN_WEIGHT: f64 = 0.0001;

/// Full turn in degrees.
pub const FULL_TURN: f64 = 360.0;

fn default_weight() -> f64 {
    1.0
}

/// One weighted candidate on the wheel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub label: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Segment {
    pub fn new(id: impl Into<String>, label: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            weight,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Weight as used for geometry and sampling; never zero or negative.
    pub fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            MIN_WEIGHT
        }
    }
}

/// Angular range of one segment, in degrees clockwise from the pointer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub mid_angle: f64,
    pub weight_fraction: f64,
}

impl Sector {
    /// Half-open containment: `start <= angle < end`, with `angle` in [0, 360).
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.start_angle && angle < self.end_angle
    }

    pub fn span(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

/// Sectors for a segment list together with the cumulative weights they were
/// cut from. The cumulative array is what weighted sampling walks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorSet {
    sectors: Vec<Sector>,
    cumulative: Vec<f64>,
    total_weight: f64,
}

impl SectorSet {
    pub fn build(segments: &[Segment]) -> Self {
        if segments.is_empty() {
            return Self::default();
        }

        let weights: Vec<f64> = segments.iter().map(Segment::effective_weight).collect();
        let total: f64 = weights.iter().sum();

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut sectors = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        let mut previous_end = 0.0;
        let last = weights.len() - 1;

        for (index, weight) in weights.iter().enumerate() {
            acc += weight;
            cumulative.push(acc);

            let start_angle = previous_end;
            // Pin the final edge so the sectors close the circle exactly.
            let end_angle = if index == last {
                FULL_TURN
            } else {
                FULL_TURN * acc / total
            };

            sectors.push(Sector {
                index,
                start_angle,
                end_angle,
                mid_angle: (start_angle + end_angle) / 2.0,
                weight_fraction: weight / total,
            });
            previous_end = end_angle;
        }

        Self {
            sectors,
            cumulative,
            total_weight: total,
        }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn get(&self, index: usize) -> Option<&Sector> {
        self.sectors.get(index)
    }

    pub fn cumulative_weights(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Index of the sector sitting under the fixed pointer when the wheel is
    /// rotated clockwise by `rotation` degrees.
    pub fn index_under_pointer(&self, rotation: f64) -> Option<usize> {
        if self.sectors.is_empty() {
            return None;
        }
        let local = normalize_degrees(-rotation);
        self.sectors
            .iter()
            .find(|sector| sector.contains(local))
            .map(|sector| sector.index)
            .or(Some(self.sectors.len() - 1))
    }
}

/// Normalize an angle in degrees to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(FULL_TURN);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= FULL_TURN {
        0.0
    } else {
        r
    }
}
