use super::common::*;
use crate::valuation::domain::Variable;
use crate::valuation::weights::{
    DropReason, WeightResolutionError, WeightResolver, WeightSchema, STANDARD_WEIGHTS,
};

const TOLERANCE: f64 = 1e-9;

fn resolver() -> WeightResolver {
    WeightResolver::new(0.5)
}

#[test]
fn effective_weights_sum_to_one_whatever_optional_fields_are_present() {
    let schema = WeightSchema::with_overrides([
        (Variable::PowerAmps, 0.05),
        (Variable::TrailerParking, 0.05),
    ]);

    let none = dataset(subject("1 Subject Way"), vec![comparable("2 Dock St")]);
    let some = dataset(
        subject("1 Subject Way").power_amps(400.0),
        vec![comparable("2 Dock St"), comparable("3 Dock St").power_amps(600.0)],
    );
    let all = dataset(
        subject("1 Subject Way").power_amps(400.0),
        vec![comparable("2 Dock St").power_amps(800.0)],
    );

    for dataset in [none, some, all] {
        let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");
        assert!((weights.sum() - 1.0).abs() <= TOLERANCE, "sum was {}", weights.sum());
    }
}

#[test]
fn standard_schema_needs_no_redistribution() {
    let dataset = dataset(subject("1 Subject Way"), vec![comparable("2 Dock St")]);
    let weights = resolver()
        .resolve(&WeightSchema::standard(), &dataset)
        .expect("weights resolve");

    assert!(!weights.redistributed());
    assert!(weights.dropped().is_empty());
    for (variable, base) in STANDARD_WEIGHTS {
        let effective = weights.get(variable).expect("core variable retained");
        assert!((effective - base).abs() <= TOLERANCE, "{variable}");
    }
}

#[test]
fn variable_absent_on_every_record_gives_up_its_weight() {
    let schema = WeightSchema::with_overrides([(Variable::PowerAmps, 0.1)]);
    let dataset = dataset(
        subject("1 Subject Way"),
        vec![comparable("2 Dock St"), comparable("3 Dock St")],
    );

    let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");

    assert!(weights.get(Variable::PowerAmps).is_none());
    assert!(weights.redistributed());
    let dropped = &weights.dropped()[0];
    assert_eq!(dropped.variable, Variable::PowerAmps);
    assert_eq!(dropped.reason, DropReason::AbsentOnAll);
    assert!((weights.retained_fraction() - 1.0 / 1.1).abs() <= TOLERANCE);
    assert!((weights.sum() - 1.0).abs() <= TOLERANCE);
}

#[test]
fn variable_present_on_some_records_is_not_scored() {
    let schema = WeightSchema::with_overrides([(Variable::PowerAmps, 0.1)]);
    let dataset = dataset(
        subject("1 Subject Way").power_amps(400.0),
        vec![comparable("2 Dock St"), comparable("3 Dock St")],
    );

    let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");

    assert_eq!(
        weights.dropped()[0].reason,
        DropReason::PartiallyPresent {
            present: 1,
            total: 3
        }
    );
    assert_eq!(
        weights.dropped()[0].reason.describe(),
        "present on 1 of 3 records"
    );
}

#[test]
fn optional_variable_present_everywhere_is_scored() {
    let schema = WeightSchema::with_overrides([(Variable::PowerAmps, 0.1)]);
    let dataset = dataset(
        subject("1 Subject Way").power_amps(400.0),
        vec![comparable("2 Dock St").power_amps(200.0)],
    );

    let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");

    let power = weights.get(Variable::PowerAmps).expect("power scored");
    assert!((power - 0.1 / 1.1).abs() <= TOLERANCE);
    assert!(!weights.redistributed());
}

#[test]
fn custom_weight_is_preserved_through_redistribution() {
    let schema = WeightSchema::with_overrides([
        (Variable::NetAskingRent, 0.40),
        (Variable::PowerAmps, 0.10),
    ]);
    let dataset = dataset(subject("1 Subject Way"), vec![comparable("2 Dock St")]);

    let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");

    let rent = weights.get(Variable::NetAskingRent).expect("rent scored");
    let parking = weights.get(Variable::ParkingRatio).expect("parking scored");
    assert!(weights.redistributed());
    assert!((rent / parking - 0.40 / 0.15).abs() <= 1e-9);
    assert!((rent - 0.40 / 1.24).abs() <= TOLERANCE);
    assert!(rent > 0.16);
}

#[test]
fn schema_not_summing_to_one_is_normalised_proportionally() {
    let schema = WeightSchema::with_overrides([(Variable::NetAskingRent, 0.32)]);
    let dataset = dataset(subject("1 Subject Way"), Vec::new());

    let weights = resolver().resolve(&schema, &dataset).expect("weights resolve");

    assert!((weights.sum() - 1.0).abs() <= TOLERANCE);
    let rent = weights.get(Variable::NetAskingRent).expect("rent scored");
    assert!((rent - 0.32 / 1.16).abs() <= TOLERANCE);
    assert!(!weights.redistributed());
}

#[test]
fn losing_too_much_weight_is_an_error() {
    let mut overrides: Vec<(Variable, f64)> = Variable::core()
        .into_iter()
        .map(|variable| (variable, 0.0))
        .collect();
    overrides.push((Variable::NetAskingRent, 0.2));
    overrides.push((Variable::PowerAmps, 0.8));
    let schema = WeightSchema::with_overrides(overrides);
    let dataset = dataset(subject("1 Subject Way"), vec![comparable("2 Dock St")]);

    let error = resolver()
        .resolve(&schema, &dataset)
        .expect_err("only 20% scoreable");

    match &error {
        WeightResolutionError::InsufficientScoredWeight {
            retained,
            floor,
            dropped,
        } => {
            assert!((retained - 0.2).abs() <= TOLERANCE);
            assert_eq!(*floor, 0.5);
            assert_eq!(dropped, &vec!["power_amps (absent on every record)".to_string()]);
        }
        other => panic!("expected insufficient weight, got {other:?}"),
    }
    assert!(error.to_string().contains("only 20.0%"));

    WeightResolver::new(0.1)
        .resolve(&schema, &dataset)
        .expect("lower floor accepts 20%");
}

#[test]
fn invalid_or_empty_weights_are_rejected() {
    let dataset = dataset(subject("1 Subject Way"), Vec::new());

    let negative = WeightSchema::with_overrides([(Variable::Tmi, -0.1)]);
    assert_eq!(
        resolver().resolve(&negative, &dataset),
        Err(WeightResolutionError::InvalidWeight {
            variable: Variable::Tmi,
            value: -0.1
        })
    );

    let not_a_number = WeightSchema::with_overrides([(Variable::Tmi, f64::NAN)]);
    assert!(matches!(
        resolver().resolve(&not_a_number, &dataset),
        Err(WeightResolutionError::InvalidWeight { .. })
    ));

    let zeroed = WeightSchema::with_overrides(Variable::core().into_iter().map(|v| (v, 0.0)));
    assert_eq!(
        resolver().resolve(&zeroed, &dataset),
        Err(WeightResolutionError::EmptySchema)
    );
}
