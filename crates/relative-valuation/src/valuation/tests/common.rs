use crate::valuation::domain::{
    BuildingClass, CoreAttributes, OptionalAttributes, PropertyRecord, RecordId,
    ValuationDataset, Variable,
};
use crate::valuation::engine::{RelativeValuationEngine, ValuationOutcome};
use crate::valuation::loader::ValuationRequest;
use crate::valuation::ranking::DirectionTable;
use crate::valuation::weights::WeightSchema;

/// Record with neutral defaults; tests only touch the attributes they care about.
pub(super) struct PropertyBuilder {
    record: PropertyRecord,
}

pub(super) fn subject(address: &str) -> PropertyBuilder {
    PropertyBuilder::new(address, true)
}

pub(super) fn comparable(address: &str) -> PropertyBuilder {
    PropertyBuilder::new(address, false).distance(5.0)
}

impl PropertyBuilder {
    fn new(address: &str, is_subject: bool) -> Self {
        Self {
            record: PropertyRecord {
                id: RecordId::new(address, ""),
                landlord: None,
                is_subject,
                core: CoreAttributes {
                    year_built: 2000,
                    clear_height_ft: 28.0,
                    pct_office_space: 0.1,
                    parking_ratio: 1.5,
                    distance_km: 0.0,
                    net_asking_rent: 10.0,
                    tmi: 4.0,
                    building_class: BuildingClass::B,
                    available_sf: 20_000.0,
                },
                optional: OptionalAttributes::default(),
                area_difference: 0.0,
            },
        }
    }

    pub(super) fn unit(mut self, unit: &str) -> Self {
        self.record.id.unit = unit.to_string();
        self
    }

    pub(super) fn rent(mut self, rent: f64) -> Self {
        self.record.core.net_asking_rent = rent;
        self
    }

    pub(super) fn tmi(mut self, tmi: f64) -> Self {
        self.record.core.tmi = tmi;
        self
    }

    pub(super) fn parking(mut self, ratio: f64) -> Self {
        self.record.core.parking_ratio = ratio;
        self
    }

    pub(super) fn clear_height(mut self, feet: f64) -> Self {
        self.record.core.clear_height_ft = feet;
        self
    }

    pub(super) fn office(mut self, pct: f64) -> Self {
        self.record.core.pct_office_space = pct;
        self
    }

    pub(super) fn distance(mut self, km: f64) -> Self {
        self.record.core.distance_km = km;
        self
    }

    pub(super) fn year(mut self, year: i32) -> Self {
        self.record.core.year_built = year;
        self
    }

    pub(super) fn class(mut self, class: BuildingClass) -> Self {
        self.record.core.building_class = class;
        self
    }

    pub(super) fn available_sf(mut self, sf: f64) -> Self {
        self.record.core.available_sf = sf;
        self
    }

    pub(super) fn power_amps(mut self, amps: f64) -> Self {
        self.record.optional.power_amps = Some(amps);
        self
    }

    pub(super) fn build(self) -> PropertyRecord {
        self.record
    }
}

/// Assembles a dataset and derives area difference against the subject.
pub(super) fn dataset(subject: PropertyBuilder, comparables: Vec<PropertyBuilder>) -> ValuationDataset {
    let subject = subject.build();
    let subject_sf = subject.core.available_sf;
    let comparables = comparables
        .into_iter()
        .map(|builder| {
            let mut record = builder.build();
            record.area_difference = (record.core.available_sf - subject_sf).abs();
            record
        })
        .collect();
    ValuationDataset::new(subject, comparables)
}

pub(super) fn request(dataset: ValuationDataset, weights: WeightSchema) -> ValuationRequest {
    ValuationRequest {
        dataset,
        weights,
        directions: DirectionTable::standard(),
    }
}

pub(super) fn evaluate(request: &ValuationRequest) -> ValuationOutcome {
    RelativeValuationEngine::default()
        .evaluate(request)
        .expect("valuation succeeds")
}

/// Every core variable at zero except `variable`, which carries the full weight.
pub(super) fn single_variable_weights(variable: Variable) -> WeightSchema {
    WeightSchema::with_overrides(
        Variable::core()
            .into_iter()
            .map(|core| (core, if core == variable { 1.0 } else { 0.0 })),
    )
}

/// Comparables at $8, $9 and $10 with the subject at $15; rent is the only weight.
pub(super) fn basic_ranking_request() -> ValuationRequest {
    request(
        dataset(
            subject("1 Subject Way").rent(15.0),
            vec![
                comparable("10 Eight Ave").rent(8.0),
                comparable("20 Nine Ave").rent(9.0),
                comparable("30 Ten Ave").rent(10.0),
            ],
        ),
        single_variable_weights(Variable::NetAskingRent),
    )
}

/// Two comparables share $9, so matching that price ties behind both.
pub(super) fn duplicated_rent_request() -> ValuationRequest {
    request(
        dataset(
            subject("1 Subject Way").rent(15.0),
            vec![
                comparable("10 Eight Ave").rent(8.0),
                comparable("20 Nine Ave").rent(9.0),
                comparable("22 Nine Ave").rent(9.0),
                comparable("30 Ten Ave").rent(10.0),
            ],
        ),
        single_variable_weights(Variable::NetAskingRent),
    )
}

/// Ten records under the standard schema; the subject lands second.
pub(super) fn already_competitive_request() -> ValuationRequest {
    let comparables = (0..9u32)
        .map(|step| {
            let rent = 10.0 + f64::from(step);
            comparable(&format!("{} Market St", 100 + step)).rent(rent)
        })
        .collect();
    request(
        dataset(subject("1 Subject Way").rent(10.5), comparables),
        WeightSchema::standard(),
    )
}

/// Subject loses on every physical attribute, so no price brings it into the top 3.
pub(super) fn dominated_subject_request() -> ValuationRequest {
    let comparables = [8.0, 9.0, 10.0, 11.0, 12.0]
        .into_iter()
        .enumerate()
        .map(|(index, rent)| comparable(&format!("{} Logistics Dr", index + 1)).rent(rent))
        .collect();
    request(
        dataset(
            subject("1 Subject Way")
                .rent(14.0)
                .tmi(6.0)
                .parking(0.5)
                .clear_height(18.0)
                .office(0.5)
                .year(1970)
                .class(BuildingClass::C),
            comparables,
        ),
        WeightSchema::standard(),
    )
}

/// Mixed attributes, including ties, across six records.
pub(super) fn mixed_request() -> ValuationRequest {
    request(
        dataset(
            subject("1 Subject Way").rent(11.0).tmi(4.5).clear_height(32.0),
            vec![
                comparable("2 Harbour Rd").rent(9.5).tmi(4.5).distance(2.0).available_sf(18_000.0),
                comparable("3 Harbour Rd").rent(11.0).parking(2.0).distance(2.0).year(2015),
                comparable("4 Harbour Rd")
                    .rent(12.25)
                    .tmi(3.75)
                    .clear_height(24.0)
                    .class(BuildingClass::A),
                comparable("5 Harbour Rd").unit("B").rent(8.75).office(0.3).distance(9.0),
                comparable("5 Harbour Rd").unit("C").rent(8.75).office(0.05).available_sf(35_000.0),
            ],
        ),
        WeightSchema::standard(),
    )
}
