//! Relative valuation: ranks a subject lease property against market
//! comparables with a weighted multi-criteria score, then measures how far the
//! subject sits from the competitive top 3 and what pricing would close it.

pub mod csv_import;
pub mod domain;
pub mod engine;
pub mod loader;
pub mod ranking;
pub mod report;
pub mod scoring;
pub mod sensitivity;
pub mod weights;

#[cfg(test)]
mod tests;

pub use csv_import::{ComparableCsvImporter, ComparableImportError};
pub use domain::{Direction, PropertyRecord, RecordId, ValuationDataset, Variable};
pub use engine::{EngineConfig, RelativeValuationEngine, ValuationError, ValuationOutcome};
pub use loader::{load_request, ValidationError, ValuationInput, ValuationRequest};
pub use ranking::DirectionTable;
pub use report::{CompetitiveStatus, ValuationReport};
pub use sensitivity::{ScenarioKind, NOT_CLOSEABLE_FINDING};
pub use weights::{EffectiveWeights, WeightResolutionError, WeightSchema};
