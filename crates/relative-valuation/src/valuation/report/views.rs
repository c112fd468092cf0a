use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummaryView {
    pub address: String,
    pub unit: String,
    pub final_rank: usize,
    pub weighted_score: f64,
    pub status: String,
    pub status_label: String,
    pub variable_ranks: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedVariableView {
    pub variable: String,
    pub label: String,
    pub base_weight: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRowView {
    pub final_rank: usize,
    pub address: String,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landlord: Option<String>,
    pub is_subject: bool,
    pub weighted_score: f64,
    pub net_asking_rent: f64,
    pub tmi: f64,
    pub gross_rent: f64,
    pub available_sf: f64,
    pub building_class: String,
    pub variable_ranks: BTreeMap<String, u32>,
    pub contributions: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisView {
    pub subject_score: f64,
    pub subject_final_rank: usize,
    pub threshold_rank: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_score: Option<f64>,
    pub gap: f64,
    pub within_cutoff: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioView {
    pub scenario: String,
    pub label: String,
    pub current_rent: f64,
    pub current_tmi: f64,
    pub proposed_rent: f64,
    pub proposed_tmi: f64,
    pub rent_delta: f64,
    pub tmi_delta: f64,
    pub reduction_pct: f64,
    pub projected_score: f64,
    pub projected_rank: usize,
    pub closes_gap: bool,
    pub candidates_evaluated: usize,
}

/// Output document handed to renderers; only plain data crosses this boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub record_count: usize,
    pub subject: SubjectSummaryView,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<String>,
    pub effective_weights: BTreeMap<String, f64>,
    pub weights_redistributed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_variables: Vec<DroppedVariableView>,
    pub directions: BTreeMap<String, String>,
    pub ranked_table: Vec<RankedRowView>,
    pub gap_analysis: GapAnalysisView,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivity_scenarios: Vec<ScenarioView>,
}
