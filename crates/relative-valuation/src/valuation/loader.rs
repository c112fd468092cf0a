use super::domain::{
    Availability, BuildingClass, CoreAttributes, Direction, OptionalAttributes, PropertyRecord,
    RecordId, ValuationDataset, Variable,
};
use super::ranking::DirectionTable;
use super::weights::WeightSchema;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use thiserror::Error;
use tracing::debug;

const MIN_YEAR_BUILT: i64 = 1800;
const MAX_YEAR_BUILT: i64 = 2100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{record}: missing required field '{field}'")]
    MissingField { record: String, field: &'static str },

    #[error("{record}: invalid '{field}' (expected {expected}, found {actual})")]
    InvalidValue {
        record: String,
        field: &'static str,
        expected: &'static str,
        actual: String,
    },

    #[error("{record}: duplicate address/unit; every record must be unique")]
    DuplicateRecord { record: String },

    #[error("{record}: only the subject_property may set is_subject")]
    UnexpectedSubject { record: String },

    #[error("unknown variable '{name}' in {context}")]
    UnknownVariable { name: String, context: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field, .. } | Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Input document as it arrives on disk, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValuationInput {
    pub subject_property: RawPropertyRecord,
    #[serde(default)]
    pub comparables: Vec<RawPropertyRecord>,
    /// Raw so a non-numeric weight is reported against its variable.
    #[serde(default)]
    pub weights: BTreeMap<String, Value>,
    #[serde(default)]
    pub directions: BTreeMap<String, Direction>,
}

impl ValuationInput {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Loosely typed record; every field is checked by [`load_request`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPropertyRecord {
    pub address: Option<Value>,
    pub unit: Option<Value>,
    pub landlord: Option<Value>,
    pub is_subject: Option<Value>,
    pub year_built: Option<Value>,
    pub clear_height_ft: Option<Value>,
    pub pct_office_space: Option<Value>,
    pub parking_ratio: Option<Value>,
    pub distance_km: Option<Value>,
    pub net_asking_rent: Option<Value>,
    pub tmi: Option<Value>,
    pub building_class: Option<Value>,
    pub available_sf: Option<Value>,
    pub shipping_doors_truck_level: Option<Value>,
    pub shipping_doors_drive_in: Option<Value>,
    pub power_amps: Option<Value>,
    pub trailer_parking: Option<Value>,
    pub secure_shipping: Option<Value>,
    pub excess_land: Option<Value>,
    pub availability_date: Option<Value>,
}

/// Everything the engine needs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationRequest {
    pub dataset: ValuationDataset,
    pub weights: WeightSchema,
    pub directions: DirectionTable,
}

pub fn load_request(input: ValuationInput) -> Result<ValuationRequest, ValidationError> {
    let weights = parse_weight_overrides(&input.weights)?;
    let directions = parse_direction_overrides(&input.directions)?;
    let dataset = load_dataset(&input.subject_property, &input.comparables)?;

    debug!(
        records = dataset.len(),
        weight_overrides = input.weights.len(),
        direction_overrides = directions.overridden().count(),
        "valuation input validated"
    );

    Ok(ValuationRequest {
        dataset,
        weights,
        directions,
    })
}

pub fn load_dataset(
    subject: &RawPropertyRecord,
    comparables: &[RawPropertyRecord],
) -> Result<ValuationDataset, ValidationError> {
    let subject_fields = FieldReader::new(subject, "subject property".to_string());
    let subject_available = subject_fields.number("available_sf", &subject.available_sf)?;
    let mut subject_record = read_record(&subject_fields, true, subject_available)?;
    subject_record.area_difference = 0.0;

    let mut seen = HashSet::new();
    seen.insert(subject_record.id.clone());

    let mut records = Vec::with_capacity(comparables.len());
    for (index, raw) in comparables.iter().enumerate() {
        let fields = FieldReader::new(raw, format!("comparable #{}", index + 1));
        if fields.flag("is_subject", &raw.is_subject)?.unwrap_or(false) {
            return Err(ValidationError::UnexpectedSubject {
                record: fields.label,
            });
        }
        let record = read_record(&fields, false, subject_available)?;
        if !seen.insert(record.id.clone()) {
            return Err(ValidationError::DuplicateRecord {
                record: fields.label,
            });
        }
        records.push(record);
    }

    Ok(ValuationDataset::new(subject_record, records))
}

fn parse_weight_overrides(raw: &BTreeMap<String, Value>) -> Result<WeightSchema, ValidationError> {
    let mut overrides = Vec::with_capacity(raw.len());
    for (name, weight) in raw {
        let variable = Variable::from_key(name).ok_or_else(|| ValidationError::UnknownVariable {
            name: name.clone(),
            context: "weights",
        })?;
        let weight = weight.as_f64().ok_or_else(|| ValidationError::InvalidValue {
            record: "weights".to_string(),
            field: variable.key(),
            expected: "a number",
            actual: weight.to_string(),
        })?;
        overrides.push((variable, weight));
    }
    Ok(WeightSchema::with_overrides(overrides))
}

fn parse_direction_overrides(
    raw: &BTreeMap<String, Direction>,
) -> Result<DirectionTable, ValidationError> {
    let mut table = DirectionTable::standard();
    for (name, direction) in raw {
        let variable = Variable::from_key(name).ok_or_else(|| ValidationError::UnknownVariable {
            name: name.clone(),
            context: "directions",
        })?;
        table = table.with_override(variable, *direction);
    }
    Ok(table)
}

fn read_record(
    fields: &FieldReader<'_>,
    is_subject: bool,
    subject_available_sf: f64,
) -> Result<PropertyRecord, ValidationError> {
    let raw = fields.raw;
    let address = fields.text("address", &raw.address)?;
    let unit = fields.optional_text("unit", &raw.unit)?.unwrap_or_default();
    let landlord = fields.optional_text("landlord", &raw.landlord)?;

    let year_built = fields.integer("year_built", &raw.year_built)?;
    if !(MIN_YEAR_BUILT..=MAX_YEAR_BUILT).contains(&year_built) {
        return Err(fields.invalid(
            "year_built",
            "a year between 1800 and 2100",
            year_built.to_string(),
        ));
    }

    let clear_height_ft = fields.non_negative("clear_height_ft", &raw.clear_height_ft)?;
    let pct_office_space = fields.fraction("pct_office_space", &raw.pct_office_space)?;
    let parking_ratio = fields.non_negative("parking_ratio", &raw.parking_ratio)?;
    let net_asking_rent = fields.non_negative("net_asking_rent", &raw.net_asking_rent)?;
    let tmi = fields.non_negative("tmi", &raw.tmi)?;
    let building_class = fields.building_class("building_class", &raw.building_class)?;
    let available_sf = fields.non_negative("available_sf", &raw.available_sf)?;

    let distance_km = if is_subject {
        match fields.optional_non_negative("distance_km", &raw.distance_km)? {
            Some(distance) if distance != 0.0 => {
                return Err(fields.invalid(
                    "distance_km",
                    "0 for the subject property",
                    distance.to_string(),
                ));
            }
            _ => 0.0,
        }
    } else {
        fields.non_negative("distance_km", &raw.distance_km)?
    };

    let optional = OptionalAttributes {
        shipping_doors_truck_level: fields
            .optional_count("shipping_doors_truck_level", &raw.shipping_doors_truck_level)?,
        shipping_doors_drive_in: fields
            .optional_count("shipping_doors_drive_in", &raw.shipping_doors_drive_in)?,
        power_amps: fields.optional_non_negative("power_amps", &raw.power_amps)?,
        trailer_parking: fields.flag("trailer_parking", &raw.trailer_parking)?,
        secure_shipping: fields.flag("secure_shipping", &raw.secure_shipping)?,
        excess_land: fields.flag("excess_land", &raw.excess_land)?,
        availability_date: fields.availability("availability_date", &raw.availability_date)?,
    };

    Ok(PropertyRecord {
        id: RecordId::new(address, unit),
        landlord,
        is_subject,
        core: CoreAttributes {
            year_built: year_built as i32,
            clear_height_ft,
            pct_office_space,
            parking_ratio,
            distance_km,
            net_asking_rent,
            tmi,
            building_class,
            available_sf,
        },
        optional,
        area_difference: (available_sf - subject_available_sf).abs(),
    })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Field accessors that attach the record label to every failure.
struct FieldReader<'a> {
    raw: &'a RawPropertyRecord,
    label: String,
}

impl<'a> FieldReader<'a> {
    fn new(raw: &'a RawPropertyRecord, fallback: String) -> Self {
        let label = match raw.address.as_ref() {
            Some(Value::String(address)) if !address.trim().is_empty() => {
                format!("{fallback} ({})", address.trim())
            }
            _ => fallback,
        };
        Self { raw, label }
    }

    fn missing(&self, field: &'static str) -> ValidationError {
        ValidationError::MissingField {
            record: self.label.clone(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, expected: &'static str, actual: String) -> ValidationError {
        ValidationError::InvalidValue {
            record: self.label.clone(),
            field,
            expected,
            actual,
        }
    }

    fn present<'v>(&self, value: &'v Option<Value>) -> Option<&'v Value> {
        value.as_ref().filter(|value| !is_blank(value))
    }

    fn text(&self, field: &'static str, value: &Option<Value>) -> Result<String, ValidationError> {
        self.optional_text(field, value)?
            .ok_or_else(|| self.missing(field))
    }

    fn optional_text(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<Option<String>, ValidationError> {
        match self.present(value) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.trim().to_string())),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            Some(other) => Err(self.invalid(field, "text", other.to_string())),
        }
    }

    fn optional_number(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<Option<f64>, ValidationError> {
        let Some(value) = self.present(value) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => parse_numeric_text(text),
            _ => None,
        };
        match parsed {
            Some(number) if number.is_finite() => Ok(Some(number)),
            _ => Err(self.invalid(field, "a number", value.to_string())),
        }
    }

    fn number(&self, field: &'static str, value: &Option<Value>) -> Result<f64, ValidationError> {
        self.optional_number(field, value)?
            .ok_or_else(|| self.missing(field))
    }

    fn non_negative(&self, field: &'static str, value: &Option<Value>) -> Result<f64, ValidationError> {
        self.optional_non_negative(field, value)?
            .ok_or_else(|| self.missing(field))
    }

    fn optional_non_negative(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<Option<f64>, ValidationError> {
        match self.optional_number(field, value)? {
            Some(number) if number < 0.0 => {
                Err(self.invalid(field, "a non-negative number", number.to_string()))
            }
            other => Ok(other),
        }
    }

    fn fraction(&self, field: &'static str, value: &Option<Value>) -> Result<f64, ValidationError> {
        let number = self.number(field, value)?;
        if !(0.0..=1.0).contains(&number) {
            return Err(self.invalid(field, "a fraction between 0 and 1", number.to_string()));
        }
        Ok(number)
    }

    fn integer(&self, field: &'static str, value: &Option<Value>) -> Result<i64, ValidationError> {
        let number = self.number(field, value)?;
        if number.fract() != 0.0 {
            return Err(self.invalid(field, "a whole number", number.to_string()));
        }
        Ok(number as i64)
    }

    fn optional_count(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<Option<u32>, ValidationError> {
        match self.optional_number(field, value)? {
            None => Ok(None),
            Some(number) if number >= 0.0 && number.fract() == 0.0 && number <= f64::from(u32::MAX) => {
                Ok(Some(number as u32))
            }
            Some(number) => Err(self.invalid(field, "a non-negative whole number", number.to_string())),
        }
    }

    fn flag(&self, field: &'static str, value: &Option<Value>) -> Result<Option<bool>, ValidationError> {
        let Some(value) = self.present(value) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => match number.as_f64() {
                Some(n) if n == 1.0 => Some(true),
                Some(n) if n == 0.0 => Some(false),
                _ => None,
            },
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(field, "true or false", value.to_string()))
    }

    fn building_class(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<BuildingClass, ValidationError> {
        let value = self.present(value).ok_or_else(|| self.missing(field))?;
        let parsed = match value {
            Value::String(text) => BuildingClass::parse(text),
            Value::Number(number) => BuildingClass::parse(&number.to_string()),
            _ => None,
        };
        parsed.ok_or_else(|| self.invalid(field, "building class A, B or C", value.to_string()))
    }

    fn availability(
        &self,
        field: &'static str,
        value: &Option<Value>,
    ) -> Result<Option<Availability>, ValidationError> {
        let Some(value) = self.present(value) else {
            return Ok(None);
        };
        let Value::String(text) = value else {
            return Err(self.invalid(field, "\"Immediate\" or YYYY-MM-DD", value.to_string()));
        };
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("immediate") {
            return Ok(Some(Availability::Immediate));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|date| Some(Availability::On(date)))
            .map_err(|_| self.invalid(field, "\"Immediate\" or YYYY-MM-DD", value.to_string()))
    }
}

/// Accepts the formats MLS exports use: `$8.50`, `12,500`, `15%`.
fn parse_numeric_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (body, percent) = match trimmed.strip_suffix('%') {
        Some(body) => (body, true),
        None => (trimmed, false),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    let number = cleaned.parse::<f64>().ok()?;
    Some(if percent { number / 100.0 } else { number })
}
