//! Resolving which sector a spin must land on.

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::segments::{SectorSet, Segment};
use crate::log_warn;

const ENABLE_LOGS: bool = true;

/// What to do when an externally resolved winner id matches no segment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum UnmatchedWinnerPolicy {
    /// Refuse the spin and report the unresolved id.
    #[default]
    Unresolved,
    /// Land on the first segment, as older hosts expect.
    FirstSegment,
}

/// How the outcome is decided.
#[derive(Debug, Clone, PartialEq)]
pub enum WinnerRequest<'a> {
    /// Outcome already decided elsewhere; the wheel only has to honor it.
    External(&'a str),
    /// Outcome drawn locally from the random stream.
    Sampled,
}

impl<'a> WinnerRequest<'a> {
    /// Empty ids count as "no external winner".
    pub fn from_winner_id(winner_id: Option<&'a str>) -> Self {
        match winner_id {
            Some(id) if !id.is_empty() => WinnerRequest::External(id),
            _ => WinnerRequest::Sampled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Chosen(usize),
    Unresolved { requested: String },
    /// Nothing to choose from.
    Empty,
}

pub struct WinnerSelector {
    policy: UnmatchedWinnerPolicy,
}

impl WinnerSelector {
    pub fn new(policy: UnmatchedWinnerPolicy) -> Self {
        Self { policy }
    }

    pub fn select(
        &self,
        segments: &[Segment],
        sectors: &SectorSet,
        request: &WinnerRequest<'_>,
        rng: &mut RandomSource,
    ) -> Selection {
        if sectors.is_empty() {
            return Selection::Empty;
        }

        match request {
            WinnerRequest::External(id) => match segments.iter().position(|s| s.id == *id) {
                Some(index) => Selection::Chosen(index),
                None => match self.policy {
                    UnmatchedWinnerPolicy::Unresolved => {
                        log_warn!("winner id {id:?} matches no segment; spin refused");
                        Selection::Unresolved {
                            requested: id.to_string(),
                        }
                    }
                    UnmatchedWinnerPolicy::FirstSegment => {
                        log_warn!("winner id {id:?} matches no segment; landing on first segment");
                        Selection::Chosen(0)
                    }
                },
            },
            WinnerRequest::Sampled => {
                let draw = rng.next();
                Selection::Chosen(pick_weighted_index(
                    sectors.cumulative_weights(),
                    sectors.total_weight(),
                    draw,
                ))
            }
        }
    }
}

/// Standard weighted-index sampling over a cumulative weight array.
///
/// Returns the first index whose cumulative weight meets or exceeds
/// `draw * total`; floating error past the nominal total picks the last index.
/// `cumulative` must be non-empty.
pub fn pick_weighted_index(cumulative: &[f64], total: f64, draw: f64) -> usize {
    let target = draw * total;
    cumulative
        .iter()
        .position(|&acc| acc >= target)
        .unwrap_or_else(|| cumulative.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::Seed;

    fn wheel() -> (Vec<Segment>, SectorSet) {
        let segments = vec![
            Segment::new("a", "Alpha", 1.0),
            Segment::new("b", "Bravo", 3.0),
            Segment::new("c", "Charlie", 0.0),
        ];
        let sectors = SectorSet::build(&segments);
        (segments, sectors)
    }

    #[test]
    fn external_winner_first_match() {
        let (mut segments, _) = wheel();
        segments.push(Segment::new("b", "Duplicate", 1.0));
        let sectors = SectorSet::build(&segments);
        let selector = WinnerSelector::new(UnmatchedWinnerPolicy::Unresolved);
        let mut rng = RandomSource::new(Some(&Seed::from(1u64)));
        let sel = selector.select(&segments, &sectors, &WinnerRequest::External("b"), &mut rng);
        assert_eq!(sel, Selection::Chosen(1));
    }

    #[test]
    fn unmatched_external_winner_is_reported() {
        let (segments, sectors) = wheel();
        let selector = WinnerSelector::new(UnmatchedWinnerPolicy::Unresolved);
        let mut rng = RandomSource::new(None);
        let sel = selector.select(&segments, &sectors, &WinnerRequest::External("zzz"), &mut rng);
        assert_eq!(
            sel,
            Selection::Unresolved {
                requested: "zzz".into()
            }
        );
    }

    #[test]
    fn unmatched_external_winner_can_fall_back_to_first() {
        let (segments, sectors) = wheel();
        let selector = WinnerSelector::new(UnmatchedWinnerPolicy::FirstSegment);
        let mut rng = RandomSource::new(None);
        let sel = selector.select(&segments, &sectors, &WinnerRequest::External("zzz"), &mut rng);
        assert_eq!(sel, Selection::Chosen(0));
    }

    #[test]
    fn empty_id_means_sampled() {
        assert_eq!(WinnerRequest::from_winner_id(Some("")), WinnerRequest::Sampled);
        assert_eq!(WinnerRequest::from_winner_id(None), WinnerRequest::Sampled);
        assert_eq!(
            WinnerRequest::from_winner_id(Some("x")),
            WinnerRequest::External("x")
        );
    }

    #[test]
    fn weighted_pick_boundaries() {
        let cumulative = [1.0, 4.0, 4.5];
        assert_eq!(pick_weighted_index(&cumulative, 4.5, 0.0), 0);
        // Exactly on a boundary belongs to the lower sector.
        assert_eq!(pick_weighted_index(&[1.0, 4.0], 4.0, 0.25), 0);
        assert_eq!(pick_weighted_index(&cumulative, 4.5, 0.5), 1);
        assert_eq!(pick_weighted_index(&cumulative, 4.5, 0.99), 2);
        // A draw pushed past the total by rounding still lands somewhere.
        assert_eq!(pick_weighted_index(&cumulative, 4.5, 1.0000001), 2);
    }

    #[test]
    fn seeded_sampling_is_repeatable() {
        let (segments, sectors) = wheel();
        let selector = WinnerSelector::new(UnmatchedWinnerPolicy::Unresolved);
        let picks = |seed: &str| -> Vec<Selection> {
            let mut rng = RandomSource::new(Some(&Seed::from(seed)));
            (0..20)
                .map(|_| selector.select(&segments, &sectors, &WinnerRequest::Sampled, &mut rng))
                .collect()
        };
        assert_eq!(picks("audit"), picks("audit"));
    }

    #[test]
    fn sampling_roughly_follows_weights() {
        let segments = vec![Segment::new("a", "A", 1.0), Segment::new("b", "B", 3.0)];
        let sectors = SectorSet::build(&segments);
        let selector = WinnerSelector::new(UnmatchedWinnerPolicy::Unresolved);
        let mut rng = RandomSource::new(Some(&Seed::from("distribution")));
        let mut hits_b = 0;
        for _ in 0..4000 {
            if selector.select(&segments, &sectors, &WinnerRequest::Sampled, &mut rng)
                == Selection::Chosen(1)
            {
                hits_b += 1;
            }
        }
        let share = f64::from(hits_b) / 4000.0;
        assert!((0.70..0.80).contains(&share), "share of b was {share}");
    }
}
