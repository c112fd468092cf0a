//! Gap to the competitive threshold and the pricing moves that would close it.
//!
//! Ranks are a step function of price, so the search walks the distinct
//! comparable prices below the subject's (nearest first) and re-scores the
//! full dataset at each step instead of solving for a continuous value.
//! Score ties count against the subject, so matching a price held by several
//! comparables lands behind all of them; those prices are also tried one
//! [`PRICE_STEP`] under, which is the cheapest way past the whole group.

use super::domain::{PropertyRecord, RecordId, ValuationDataset};
use super::ranking::{rank_records, DirectionTable, TIE_TOLERANCE};
use super::scoring::{score_records, Scoreboard};
use super::weights::EffectiveWeights;
use tracing::debug;

/// Final ranks 1 through 3 are considered competitive.
pub const COMPETITIVE_CUTOFF: usize = 3;

/// Smallest quoted price increment, in dollars per square foot.
pub const PRICE_STEP: f64 = 0.01;

pub const NOT_CLOSEABLE_FINDING: &str = "gap not closeable via rent/TMI adjustment alone";

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRecord {
    pub id: RecordId,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GapAnalysis {
    pub subject_score: f64,
    pub subject_final_rank: usize,
    pub threshold: Option<ThresholdRecord>,
    pub gap: f64,
}

impl GapAnalysis {
    pub fn within_cutoff(&self) -> bool {
        self.subject_final_rank <= COMPETITIVE_CUTOFF
    }
}

pub fn analyze_gap(scoreboard: &Scoreboard) -> GapAnalysis {
    let (subject_score, subject_final_rank) = scoreboard
        .subject()
        .map(|subject| (subject.weighted_score, subject.final_rank))
        .unwrap_or((0.0, 1));
    let threshold = scoreboard
        .at_rank(COMPETITIVE_CUTOFF)
        .map(|record| ThresholdRecord {
            id: record.id.clone(),
            weighted_score: record.weighted_score,
        });

    let gap = match &threshold {
        Some(threshold) if subject_final_rank > COMPETITIVE_CUTOFF => {
            (subject_score - threshold.weighted_score).max(0.0)
        }
        _ => 0.0,
    };

    GapAnalysis {
        subject_score,
        subject_final_rank,
        threshold,
        gap,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    RentReduction,
    TmiReduction,
    CombinedReduction,
}

impl ScenarioKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::RentReduction, Self::TmiReduction, Self::CombinedReduction]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::RentReduction => "rent_reduction",
            Self::TmiReduction => "tmi_reduction",
            Self::CombinedReduction => "combined_reduction",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RentReduction => "Option A: reduce net asking rent",
            Self::TmiReduction => "Option B: reduce TMI",
            Self::CombinedReduction => "Option C: proportional rent and TMI reduction",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityScenario {
    pub kind: ScenarioKind,
    pub current_rent: f64,
    pub current_tmi: f64,
    pub proposed_rent: f64,
    pub proposed_tmi: f64,
    pub projected_score: f64,
    /// Subject rank with score ties resolved against it.
    pub projected_rank: usize,
    pub closes_gap: bool,
    pub candidates_evaluated: usize,
}

impl SensitivityScenario {
    pub fn rent_delta(&self) -> f64 {
        self.proposed_rent - self.current_rent
    }

    pub fn tmi_delta(&self) -> f64 {
        self.proposed_tmi - self.current_tmi
    }

    /// Reduction in gross occupancy cost, as a fraction of the current cost.
    pub fn reduction_pct(&self) -> f64 {
        let current = self.current_rent + self.current_tmi;
        if current <= 0.0 {
            return 0.0;
        }
        (current - (self.proposed_rent + self.proposed_tmi)) / current
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityAnalysis {
    pub gap: GapAnalysis,
    pub scenarios: Vec<SensitivityScenario>,
}

impl SensitivityAnalysis {
    /// `None` while the subject is already competitive.
    pub fn closeable(&self) -> Option<bool> {
        if self.gap.within_cutoff() || self.scenarios.is_empty() {
            return None;
        }
        Some(self.scenarios.iter().any(|scenario| scenario.closes_gap))
    }

    pub fn finding(&self) -> Option<&'static str> {
        match self.closeable() {
            Some(false) => Some(NOT_CLOSEABLE_FINDING),
            _ => None,
        }
    }

    /// Closing scenario with the smallest cut to gross occupancy cost.
    pub fn best_scenario(&self) -> Option<&SensitivityScenario> {
        self.scenarios
            .iter()
            .filter(|scenario| scenario.closes_gap)
            .min_by(|left, right| left.reduction_pct().total_cmp(&right.reduction_pct()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PriceCandidate {
    rent: f64,
    tmi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    score: f64,
    rank: usize,
}

/// What-if search over the subject's rent and TMI.
pub struct SensitivitySearch<'a> {
    dataset: &'a ValuationDataset,
    weights: &'a EffectiveWeights,
    directions: &'a DirectionTable,
}

impl<'a> SensitivitySearch<'a> {
    pub fn new(
        dataset: &'a ValuationDataset,
        weights: &'a EffectiveWeights,
        directions: &'a DirectionTable,
    ) -> Self {
        Self {
            dataset,
            weights,
            directions,
        }
    }

    pub fn analyze(&self, scoreboard: &Scoreboard) -> SensitivityAnalysis {
        let gap = analyze_gap(scoreboard);
        let scenarios = if gap.within_cutoff() || gap.threshold.is_none() {
            Vec::new()
        } else {
            ScenarioKind::ordered()
                .into_iter()
                .map(|kind| self.scenario(kind))
                .collect()
        };

        SensitivityAnalysis { gap, scenarios }
    }

    pub fn scenario(&self, kind: ScenarioKind) -> SensitivityScenario {
        let subject = self.dataset.subject();
        let current = PriceCandidate {
            rent: subject.core.net_asking_rent,
            tmi: subject.core.tmi,
        };

        let candidates: Vec<PriceCandidate> = match kind {
            ScenarioKind::RentReduction => self
                .lower_values(current.rent, |record| record.core.net_asking_rent)
                .into_iter()
                .map(|rent| PriceCandidate {
                    rent,
                    tmi: current.tmi,
                })
                .collect(),
            ScenarioKind::TmiReduction => self
                .lower_values(current.tmi, |record| record.core.tmi)
                .into_iter()
                .map(|tmi| PriceCandidate {
                    rent: current.rent,
                    tmi,
                })
                .collect(),
            ScenarioKind::CombinedReduction => self.proportional_candidates(current),
        };

        let mut chosen = current;
        let mut projection = self.project(current);
        let mut closes_gap = false;
        let mut evaluated = 0;

        for candidate in &candidates {
            evaluated += 1;
            chosen = *candidate;
            projection = self.project(*candidate);
            if projection.rank <= COMPETITIVE_CUTOFF {
                closes_gap = true;
                break;
            }
        }

        debug!(
            scenario = kind.key(),
            evaluated,
            closes_gap,
            projected_rank = projection.rank,
            "sensitivity scenario evaluated"
        );

        SensitivityScenario {
            kind,
            current_rent: current.rent,
            current_tmi: current.tmi,
            proposed_rent: chosen.rent,
            proposed_tmi: chosen.tmi,
            projected_score: projection.score,
            projected_rank: projection.rank,
            closes_gap,
            candidates_evaluated: evaluated,
        }
    }

    /// Price points strictly below `current`, nearest first: every distinct
    /// comparable value, followed by one step under it when more than one
    /// comparable shares that value.
    fn lower_values<F>(&self, current: f64, field: F) -> Vec<f64>
    where
        F: Fn(&PropertyRecord) -> f64,
    {
        let mut values: Vec<f64> = self
            .dataset
            .comparables()
            .iter()
            .map(field)
            .filter(|value| *value < current - TIE_TOLERANCE)
            .collect();
        values.sort_by(|left, right| right.total_cmp(left));

        let mut points = Vec::with_capacity(values.len());
        let mut index = 0;
        while index < values.len() {
            let value = values[index];
            let shared = values[index..]
                .iter()
                .take_while(|other| (value - **other).abs() <= TIE_TOLERANCE)
                .count();
            index += shared;
            points.push(value);

            let undercut = value - PRICE_STEP;
            let clear_of_next = values
                .get(index)
                .map_or(true, |next| undercut > next + TIE_TOLERANCE);
            if shared > 1 && undercut >= 0.0 && clear_of_next {
                points.push(undercut);
            }
        }
        points
    }

    /// One uniform percentage cut to both levers. Candidate cuts are the ones
    /// that land either lever on one of its price points.
    fn proportional_candidates(&self, current: PriceCandidate) -> Vec<PriceCandidate> {
        let mut cuts: Vec<(f64, PriceCandidate)> = Vec::new();

        if current.rent > 0.0 {
            for rent in self.lower_values(current.rent, |record| record.core.net_asking_rent) {
                let cut = (current.rent - rent) / current.rent;
                cuts.push((
                    cut,
                    PriceCandidate {
                        rent,
                        tmi: current.tmi * (1.0 - cut),
                    },
                ));
            }
        }

        if current.tmi > 0.0 {
            for tmi in self.lower_values(current.tmi, |record| record.core.tmi) {
                let cut = (current.tmi - tmi) / current.tmi;
                cuts.push((
                    cut,
                    PriceCandidate {
                        rent: current.rent * (1.0 - cut),
                        tmi,
                    },
                ));
            }
        }

        cuts.sort_by(|left, right| left.0.total_cmp(&right.0));
        cuts.dedup_by(|later, earlier| (later.0 - earlier.0).abs() <= TIE_TOLERANCE);
        cuts.into_iter().map(|(_, candidate)| candidate).collect()
    }

    fn project(&self, candidate: PriceCandidate) -> Projection {
        let repriced = self
            .dataset
            .subject()
            .with_pricing(candidate.rent, candidate.tmi);
        let dataset = self.dataset.with_subject(repriced);
        let ranks = rank_records(&dataset, self.weights, self.directions);
        let scoreboard = score_records(&dataset, &ranks, self.weights);

        Projection {
            score: scoreboard
                .subject()
                .map(|subject| subject.weighted_score)
                .unwrap_or_default(),
            rank: scoreboard.conservative_subject_rank().unwrap_or(1),
        }
    }
}
