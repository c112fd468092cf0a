use super::loader::{load_request, ValidationError, ValuationInput, ValuationRequest};
use super::ranking::{rank_records, RankTable};
use super::report::ValuationReport;
use super::scoring::{score_records, Scoreboard};
use super::sensitivity::{SensitivityAnalysis, SensitivitySearch};
use super::weights::{EffectiveWeights, WeightResolutionError, WeightResolver};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_MIN_SCORED_WEIGHT: f64 = 0.5;

/// Engine tunables supplied by [`crate::config::AppConfig`] or the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Smallest share of the base weight schema that must remain scoreable.
    pub min_scored_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scored_weight: DEFAULT_MIN_SCORED_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("invalid input record: {0}")]
    Validation(#[from] ValidationError),
    #[error("weight resolution failed: {0}")]
    WeightResolution(#[from] WeightResolutionError),
}

/// Intermediate results of one run, before they are flattened into a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationOutcome {
    pub weights: EffectiveWeights,
    pub ranks: RankTable,
    pub scoreboard: Scoreboard,
    pub sensitivity: SensitivityAnalysis,
}

/// Stateless runner over the resolve → rank → score → sensitivity pipeline.
#[derive(Debug, Clone, Default)]
pub struct RelativeValuationEngine {
    config: EngineConfig,
}

impl RelativeValuationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn evaluate(&self, request: &ValuationRequest) -> Result<ValuationOutcome, ValuationError> {
        let dataset = &request.dataset;
        let weights = WeightResolver::new(self.config.min_scored_weight)
            .resolve(&request.weights, dataset)?;
        let ranks = rank_records(dataset, &weights, &request.directions);
        let scoreboard = score_records(dataset, &ranks, &weights);
        let sensitivity =
            SensitivitySearch::new(dataset, &weights, &request.directions).analyze(&scoreboard);

        info!(
            records = dataset.len(),
            subject_rank = sensitivity.gap.subject_final_rank,
            gap = sensitivity.gap.gap,
            redistributed = weights.redistributed(),
            "relative valuation complete"
        );

        Ok(ValuationOutcome {
            weights,
            ranks,
            scoreboard,
            sensitivity,
        })
    }

    pub fn run(&self, request: &ValuationRequest) -> Result<ValuationReport, ValuationError> {
        let outcome = self.evaluate(request)?;
        Ok(ValuationReport::assemble(request, &outcome))
    }

    pub fn run_input(&self, input: ValuationInput) -> Result<ValuationReport, ValuationError> {
        let request = load_request(input)?;
        self.run(&request)
    }
}
