use super::domain::{Direction, RecordId, ValuationDataset, Variable};
use super::weights::EffectiveWeights;
use std::collections::BTreeMap;

/// Attribute values closer than this are treated as equal.
pub const TIE_TOLERANCE: f64 = 1e-9;

/// Per-variable directionality, with caller overrides on top of the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionTable {
    overrides: BTreeMap<Variable, Direction>,
}

impl DirectionTable {
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, variable: Variable, direction: Direction) -> Self {
        if variable.default_direction() == direction {
            self.overrides.remove(&variable);
        } else {
            self.overrides.insert(variable, direction);
        }
        self
    }

    pub fn direction(&self, variable: Variable) -> Direction {
        self.overrides
            .get(&variable)
            .copied()
            .unwrap_or_else(|| variable.default_direction())
    }

    pub fn overridden(&self) -> impl Iterator<Item = (Variable, Direction)> + '_ {
        self.overrides
            .iter()
            .map(|(variable, direction)| (*variable, *direction))
    }
}

/// Ranks for every scored variable, keyed by record identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankTable {
    ranks: BTreeMap<Variable, BTreeMap<RecordId, u32>>,
}

impl RankTable {
    pub fn rank(&self, variable: Variable, id: &RecordId) -> Option<u32> {
        self.ranks.get(&variable).and_then(|ranks| ranks.get(id)).copied()
    }

    pub fn for_variable(&self, variable: Variable) -> Option<&BTreeMap<RecordId, u32>> {
        self.ranks.get(&variable)
    }

    pub fn for_record(&self, id: &RecordId) -> BTreeMap<Variable, u32> {
        self.ranks
            .iter()
            .filter_map(|(variable, ranks)| ranks.get(id).map(|rank| (*variable, *rank)))
            .collect()
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.ranks.keys().copied()
    }
}

/// Ranks every record on every variable carried by `weights`.
pub fn rank_records(
    dataset: &ValuationDataset,
    weights: &EffectiveWeights,
    directions: &DirectionTable,
) -> RankTable {
    let ranks = weights
        .variables()
        .map(|variable| {
            let values: Vec<Option<f64>> = dataset
                .records()
                .map(|record| record.value(variable))
                .collect();
            let ranked = competition_ranks(&values, directions.direction(variable));
            let by_record = dataset
                .records()
                .map(|record| record.id.clone())
                .zip(ranked)
                .collect();
            (variable, by_record)
        })
        .collect();

    RankTable { ranks }
}

/// Standard competition ranking ("1224"): tied values share the best rank
/// and the following rank is skipped. Missing values rank behind every value.
pub fn competition_ranks(values: &[Option<f64>], direction: Direction) -> Vec<u32> {
    values
        .iter()
        .map(|value| {
            let ahead = values
                .iter()
                .filter(|other| outranks(**other, *value, direction))
                .count();
            ahead as u32 + 1
        })
        .collect()
}

fn outranks(candidate: Option<f64>, current: Option<f64>, direction: Direction) -> bool {
    match (candidate, current) {
        (Some(_), None) => true,
        (None, _) => false,
        (Some(candidate), Some(current)) => match direction {
            Direction::LowerIsBetter => candidate < current - TIE_TOLERANCE,
            Direction::HigherIsBetter => candidate > current + TIE_TOLERANCE,
        },
    }
}
