mod summary;
pub mod views;

pub use summary::CompetitiveStatus;
pub use views::ValuationReport;
