use super::domain::{ValuationDataset, Variable};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Standard industrial weighting; the only default the engine ever falls back to.
pub const STANDARD_WEIGHTS: [(Variable, f64); 9] = [
    (Variable::NetAskingRent, 0.16),
    (Variable::ParkingRatio, 0.15),
    (Variable::Tmi, 0.14),
    (Variable::ClearHeightFt, 0.10),
    (Variable::PctOfficeSpace, 0.10),
    (Variable::DistanceKm, 0.10),
    (Variable::AreaDifference, 0.10),
    (Variable::YearBuilt, 0.08),
    (Variable::BuildingClass, 0.07),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightResolutionError {
    #[error("weight for '{variable}' must be a finite, non-negative number (found {value})")]
    InvalidWeight { variable: Variable, value: f64 },

    #[error("weight schema has no positive weight to score with")]
    EmptySchema,

    #[error(
        "only {:.1}% of the weight schema can be scored (floor {:.1}%); unscorable: {}",
        .retained * 100.0,
        .floor * 100.0,
        .dropped.join(", ")
    )]
    InsufficientScoredWeight {
        retained: f64,
        floor: f64,
        dropped: Vec<String>,
    },
}

/// Base weights per variable, before they meet a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSchema {
    weights: BTreeMap<Variable, f64>,
}

impl Default for WeightSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl WeightSchema {
    pub fn standard() -> Self {
        Self {
            weights: STANDARD_WEIGHTS.into_iter().collect(),
        }
    }

    /// Standard schema with caller entries layered on top.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (Variable, f64)>,
    {
        let mut schema = Self::standard();
        for (variable, weight) in overrides {
            schema.weights.insert(variable, weight);
        }
        schema
    }

    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.weights.get(&variable).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.weights.iter().map(|(variable, weight)| (*variable, *weight))
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    AbsentOnAll,
    PartiallyPresent { present: usize, total: usize },
}

impl DropReason {
    pub fn describe(self) -> String {
        match self {
            Self::AbsentOnAll => "absent on every record".to_string(),
            Self::PartiallyPresent { present, total } => {
                format!("present on {present} of {total} records")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DroppedVariable {
    pub variable: Variable,
    pub base_weight: f64,
    pub reason: DropReason,
}

/// Weights resolved for one dataset; always sums to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveWeights {
    weights: BTreeMap<Variable, f64>,
    dropped: Vec<DroppedVariable>,
    retained_fraction: f64,
}

impl EffectiveWeights {
    pub fn get(&self, variable: Variable) -> Option<f64> {
        self.weights.get(&variable).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.weights.iter().map(|(variable, weight)| (*variable, *weight))
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.weights.keys().copied()
    }

    pub fn dropped(&self) -> &[DroppedVariable] {
        &self.dropped
    }

    pub fn retained_fraction(&self) -> f64 {
        self.retained_fraction
    }

    pub fn redistributed(&self) -> bool {
        self.dropped.iter().any(|dropped| dropped.base_weight > 0.0)
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WeightResolver {
    min_scored_weight: f64,
}

impl WeightResolver {
    pub fn new(min_scored_weight: f64) -> Self {
        Self { min_scored_weight }
    }

    pub fn resolve(
        &self,
        schema: &WeightSchema,
        dataset: &ValuationDataset,
    ) -> Result<EffectiveWeights, WeightResolutionError> {
        for (variable, value) in schema.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(WeightResolutionError::InvalidWeight { variable, value });
            }
        }

        let total = schema.total();
        if total <= 0.0 {
            return Err(WeightResolutionError::EmptySchema);
        }
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            warn!(total, "weight schema does not sum to 1.0; normalising proportionally");
        }

        let record_count = dataset.len();
        let mut retained = BTreeMap::new();
        let mut dropped = Vec::new();

        for (variable, weight) in schema.iter() {
            let base_weight = weight / total;
            let present = if variable.is_core() {
                record_count
            } else {
                dataset.records().filter(|record| record.has(variable)).count()
            };

            if present == record_count {
                retained.insert(variable, base_weight);
                continue;
            }

            let reason = if present == 0 {
                DropReason::AbsentOnAll
            } else {
                DropReason::PartiallyPresent {
                    present,
                    total: record_count,
                }
            };
            dropped.push(DroppedVariable {
                variable,
                base_weight,
                reason,
            });
        }

        let retained_fraction: f64 = retained.values().sum();
        if retained_fraction <= 0.0 || retained_fraction + WEIGHT_TOLERANCE < self.min_scored_weight {
            return Err(WeightResolutionError::InsufficientScoredWeight {
                retained: retained_fraction,
                floor: self.min_scored_weight,
                dropped: dropped
                    .iter()
                    .map(|entry| format!("{} ({})", entry.variable, entry.reason.describe()))
                    .collect(),
            });
        }

        for dropped_variable in dropped.iter().filter(|entry| entry.base_weight > 0.0) {
            warn!(
                variable = %dropped_variable.variable,
                weight = dropped_variable.base_weight,
                reason = %dropped_variable.reason.describe(),
                "redistributing weight of unscorable variable"
            );
        }

        let weights = retained
            .into_iter()
            .map(|(variable, weight)| (variable, weight / retained_fraction))
            .collect();

        debug!(retained_fraction, dropped = dropped.len(), "weights resolved");

        Ok(EffectiveWeights {
            weights,
            dropped,
            retained_fraction,
        })
    }
}
