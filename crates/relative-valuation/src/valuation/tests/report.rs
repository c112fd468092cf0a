use super::common::*;
use crate::valuation::domain::Variable;
use crate::valuation::engine::RelativeValuationEngine;
use crate::valuation::report::ValuationReport;
use crate::valuation::weights::WeightSchema;
use crate::valuation::NOT_CLOSEABLE_FINDING;

fn report_for(request: &crate::valuation::loader::ValuationRequest) -> ValuationReport {
    RelativeValuationEngine::default()
        .run(request)
        .expect("valuation succeeds")
}

#[test]
fn basic_ranking_report_recommends_rent_cut() {
    let report = report_for(&basic_ranking_request());

    assert_eq!(report.record_count, 4);
    assert_eq!(report.subject.final_rank, 4);
    assert_eq!(report.subject.status, "marginally_competitive");
    assert_eq!(report.subject.variable_ranks["net_asking_rent"], 4);
    assert_eq!(
        report.recommendation,
        "Reduce net asking rent from $15.00 to $9.00 per sf to reach rank 3."
    );
    assert!(report.finding.is_none());

    let scenario_keys: Vec<&str> = report
        .sensitivity_scenarios
        .iter()
        .map(|scenario| scenario.scenario.as_str())
        .collect();
    assert_eq!(
        scenario_keys,
        vec!["rent_reduction", "tmi_reduction", "combined_reduction"]
    );
    assert_eq!(report.gap_analysis.threshold_address.as_deref(), Some("30 Ten Ave"));
    assert_eq!(report.gap_analysis.threshold_rank, 3);
}

#[test]
fn ranked_table_lists_every_record_in_final_order() {
    let report = report_for(&basic_ranking_request());

    let ranks: Vec<usize> = report.ranked_table.iter().map(|row| row.final_rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    let last = report.ranked_table.last().expect("rows present");
    assert!(last.is_subject);
    assert_eq!(last.gross_rent, 19.0);
    assert_eq!(last.building_class, "B");
    assert_eq!(last.contributions["net_asking_rent"], 4.0);
}

#[test]
fn competitive_subject_is_told_to_hold() {
    let report = report_for(&already_competitive_request());

    assert_eq!(report.subject.final_rank, 2);
    assert_eq!(report.subject.status, "highly_competitive");
    assert_eq!(report.subject.status_label, "Highly Competitive");
    assert!(report.recommendation.starts_with("Hold pricing"));
    assert!(report.sensitivity_scenarios.is_empty());
    assert_eq!(report.gap_analysis.gap, 0.0);
    assert!(report.gap_analysis.within_cutoff);
}

#[test]
fn infeasible_gap_is_flagged_not_failed() {
    let report = report_for(&dominated_subject_request());

    assert_eq!(report.finding.as_deref(), Some(NOT_CLOSEABLE_FINDING));
    assert!(report
        .recommendation
        .starts_with("Gap not closeable via rent/TMI adjustment alone:"));
    assert!(report.recommendation.contains("non-price terms"));
    assert_eq!(report.sensitivity_scenarios.len(), 3);
    assert!(report
        .sensitivity_scenarios
        .iter()
        .all(|scenario| !scenario.closes_gap));
}

#[test]
fn dropped_variable_is_reported_and_absent_from_breakdown() {
    let mut request = basic_ranking_request();
    request.weights = WeightSchema::with_overrides([(Variable::PowerAmps, 0.1)]);

    let report = report_for(&request);

    assert!(report.weights_redistributed);
    assert_eq!(report.dropped_variables.len(), 1);
    assert_eq!(report.dropped_variables[0].variable, "power_amps");
    assert_eq!(report.dropped_variables[0].reason, "absent on every record");
    assert!(!report.effective_weights.contains_key("power_amps"));
    assert!(report
        .ranked_table
        .iter()
        .all(|row| !row.contributions.contains_key("power_amps")));
    let total: f64 = report.effective_weights.values().sum();
    assert!((total - 1.0).abs() <= 1e-9);
}

#[test]
fn report_serializes_to_plain_json() {
    let report = report_for(&basic_ranking_request());

    let value = serde_json::to_value(&report).expect("report serializes");

    assert_eq!(value["subject"]["status"], "marginally_competitive");
    assert_eq!(value["directions"]["pct_office_space"], "lower_is_better");
    assert_eq!(value["directions"]["year_built"], "higher_is_better");
    assert!(value["ranked_table"].is_array());
    assert!(value.get("finding").is_none());
    assert!(value.get("dropped_variables").is_none());
    assert_eq!(value["sensitivity_scenarios"][0]["closes_gap"], true);
}

#[test]
fn lone_subject_report_holds_pricing() {
    let request = request(
        dataset(subject("1 Subject Way"), Vec::new()),
        WeightSchema::standard(),
    );

    let report = report_for(&request);

    assert_eq!(report.record_count, 1);
    assert_eq!(report.subject.final_rank, 1);
    assert_eq!(report.ranked_table.len(), 1);
    assert!(report.gap_analysis.threshold_address.is_none());
    assert!(report.recommendation.contains("ranks 1 of 1"));
}
