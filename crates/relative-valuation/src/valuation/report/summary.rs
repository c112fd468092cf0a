use super::super::domain::Variable;
use super::super::engine::ValuationOutcome;
use super::super::loader::ValuationRequest;
use super::super::scoring::RankedRecord;
use super::super::sensitivity::{
    ScenarioKind, SensitivityAnalysis, SensitivityScenario, COMPETITIVE_CUTOFF,
    NOT_CLOSEABLE_FINDING,
};
use super::views::{
    DroppedVariableView, GapAnalysisView, RankedRowView, ScenarioView, SubjectSummaryView,
    ValuationReport,
};
use std::collections::BTreeMap;

/// Four-tier classification driven by the subject's final rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetitiveStatus {
    HighlyCompetitive,
    MarginallyCompetitive,
    NotCompetitive,
    FundamentallyUncompetitive,
}

impl CompetitiveStatus {
    pub const fn from_rank(final_rank: usize) -> Self {
        match final_rank {
            0..=3 => Self::HighlyCompetitive,
            4..=10 => Self::MarginallyCompetitive,
            11..=20 => Self::NotCompetitive,
            _ => Self::FundamentallyUncompetitive,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::HighlyCompetitive => "highly_competitive",
            Self::MarginallyCompetitive => "marginally_competitive",
            Self::NotCompetitive => "not_competitive",
            Self::FundamentallyUncompetitive => "fundamentally_uncompetitive",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighlyCompetitive => "Highly Competitive",
            Self::MarginallyCompetitive => "Marginally Competitive",
            Self::NotCompetitive => "Not Competitive",
            Self::FundamentallyUncompetitive => "Fundamentally Uncompetitive",
        }
    }

    const fn fallback_advice(self) -> &'static str {
        match self {
            Self::HighlyCompetitive => "hold pricing",
            Self::MarginallyCompetitive => {
                "compete on non-price terms such as inducements, improvements or lease flexibility"
            }
            Self::NotCompetitive => {
                "revisit the comparable set and the subject's non-price positioning"
            }
            Self::FundamentallyUncompetitive => {
                "the subject needs physical or functional repositioning before pricing can compete"
            }
        }
    }
}

impl ValuationReport {
    pub fn assemble(request: &ValuationRequest, outcome: &ValuationOutcome) -> Self {
        let dataset = &request.dataset;
        let subject_row = outcome
            .scoreboard
            .subject()
            .map(|record| (record.final_rank, record.weighted_score))
            .unwrap_or((1, 0.0));
        let status = CompetitiveStatus::from_rank(subject_row.0);
        let subject = dataset.subject();

        let subject_view = SubjectSummaryView {
            address: subject.id.address.clone(),
            unit: subject.id.unit.clone(),
            final_rank: subject_row.0,
            weighted_score: subject_row.1,
            status: status.key().to_string(),
            status_label: status.label().to_string(),
            variable_ranks: keyed(outcome.ranks.for_record(&subject.id)),
        };

        let ranked_table = outcome
            .scoreboard
            .records()
            .iter()
            .filter_map(|ranked| {
                dataset.find(&ranked.id).map(|record| RankedRowView {
                    final_rank: ranked.final_rank,
                    address: record.id.address.clone(),
                    unit: record.id.unit.clone(),
                    landlord: record.landlord.clone(),
                    is_subject: record.is_subject,
                    weighted_score: ranked.weighted_score,
                    net_asking_rent: record.core.net_asking_rent,
                    tmi: record.core.tmi,
                    gross_rent: record.gross_rent(),
                    available_sf: record.core.available_sf,
                    building_class: record.core.building_class.label().to_string(),
                    variable_ranks: keyed(ranked.ranks.clone()),
                    contributions: contributions(ranked),
                })
            })
            .collect();

        let gap = &outcome.sensitivity.gap;
        let gap_analysis = GapAnalysisView {
            subject_score: gap.subject_score,
            subject_final_rank: gap.subject_final_rank,
            threshold_rank: COMPETITIVE_CUTOFF,
            threshold_address: gap.threshold.as_ref().map(|t| t.id.address.clone()),
            threshold_unit: gap.threshold.as_ref().map(|t| t.id.unit.clone()),
            threshold_score: gap.threshold.as_ref().map(|t| t.weighted_score),
            gap: gap.gap,
            within_cutoff: gap.within_cutoff(),
        };

        let directions = outcome
            .weights
            .variables()
            .map(|variable| {
                (
                    variable.key().to_string(),
                    request.directions.direction(variable).key().to_string(),
                )
            })
            .collect();

        ValuationReport {
            record_count: dataset.len(),
            subject: subject_view,
            recommendation: recommendation(
                &outcome.sensitivity,
                status,
                subject_row.0,
                dataset.len(),
            ),
            finding: outcome.sensitivity.finding().map(str::to_string),
            effective_weights: outcome
                .weights
                .iter()
                .map(|(variable, weight)| (variable.key().to_string(), weight))
                .collect(),
            weights_redistributed: outcome.weights.redistributed(),
            dropped_variables: outcome
                .weights
                .dropped()
                .iter()
                .map(|dropped| DroppedVariableView {
                    variable: dropped.variable.key().to_string(),
                    label: dropped.variable.label().to_string(),
                    base_weight: dropped.base_weight,
                    reason: dropped.reason.describe(),
                })
                .collect(),
            directions,
            ranked_table,
            gap_analysis,
            sensitivity_scenarios: outcome
                .sensitivity
                .scenarios
                .iter()
                .map(scenario_view)
                .collect(),
        }
    }
}

fn keyed<V>(values: BTreeMap<Variable, V>) -> BTreeMap<String, V> {
    values
        .into_iter()
        .map(|(variable, value)| (variable.key().to_string(), value))
        .collect()
}

fn contributions(ranked: &RankedRecord) -> BTreeMap<String, f64> {
    ranked
        .contributions
        .iter()
        .map(|(variable, value)| (variable.key().to_string(), *value))
        .collect()
}

fn scenario_view(scenario: &SensitivityScenario) -> ScenarioView {
    ScenarioView {
        scenario: scenario.kind.key().to_string(),
        label: scenario.kind.label().to_string(),
        current_rent: scenario.current_rent,
        current_tmi: scenario.current_tmi,
        proposed_rent: scenario.proposed_rent,
        proposed_tmi: scenario.proposed_tmi,
        rent_delta: scenario.rent_delta(),
        tmi_delta: scenario.tmi_delta(),
        reduction_pct: scenario.reduction_pct(),
        projected_score: scenario.projected_score,
        projected_rank: scenario.projected_rank,
        closes_gap: scenario.closes_gap,
        candidates_evaluated: scenario.candidates_evaluated,
    }
}

fn recommendation(
    sensitivity: &SensitivityAnalysis,
    status: CompetitiveStatus,
    final_rank: usize,
    record_count: usize,
) -> String {
    if sensitivity.gap.within_cutoff() {
        return format!(
            "Hold pricing: the subject ranks {final_rank} of {record_count} and is already within the top {COMPETITIVE_CUTOFF}."
        );
    }

    let Some(best) = sensitivity.best_scenario() else {
        return format!(
            "{}: {}.",
            capitalize(NOT_CLOSEABLE_FINDING),
            status.fallback_advice()
        );
    };

    match best.kind {
        ScenarioKind::RentReduction => format!(
            "Reduce net asking rent from ${:.2} to ${:.2} per sf to reach rank {}.",
            best.current_rent, best.proposed_rent, best.projected_rank
        ),
        ScenarioKind::TmiReduction => format!(
            "Reduce TMI from ${:.2} to ${:.2} per sf to reach rank {}.",
            best.current_tmi, best.proposed_tmi, best.projected_rank
        ),
        ScenarioKind::CombinedReduction => format!(
            "Reduce net asking rent to ${:.2} and TMI to ${:.2} per sf ({:.1}% gross cut) to reach rank {}.",
            best.proposed_rent,
            best.proposed_tmi,
            best.reduction_pct() * 100.0,
            best.projected_rank
        ),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
