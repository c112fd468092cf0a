use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every attribute the ranking engine knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    NetAskingRent,
    Tmi,
    ParkingRatio,
    ClearHeightFt,
    PctOfficeSpace,
    DistanceKm,
    AreaDifference,
    YearBuilt,
    BuildingClass,
    ShippingDoorsTruckLevel,
    ShippingDoorsDriveIn,
    PowerAmps,
    TrailerParking,
    SecureShipping,
    ExcessLand,
    AvailabilityDate,
}

impl Variable {
    pub const fn core() -> [Self; 9] {
        [
            Self::NetAskingRent,
            Self::Tmi,
            Self::ParkingRatio,
            Self::ClearHeightFt,
            Self::PctOfficeSpace,
            Self::DistanceKm,
            Self::AreaDifference,
            Self::YearBuilt,
            Self::BuildingClass,
        ]
    }

    pub const fn optional() -> [Self; 7] {
        [
            Self::ShippingDoorsTruckLevel,
            Self::ShippingDoorsDriveIn,
            Self::PowerAmps,
            Self::TrailerParking,
            Self::SecureShipping,
            Self::ExcessLand,
            Self::AvailabilityDate,
        ]
    }

    pub const fn is_core(self) -> bool {
        !matches!(
            self,
            Self::ShippingDoorsTruckLevel
                | Self::ShippingDoorsDriveIn
                | Self::PowerAmps
                | Self::TrailerParking
                | Self::SecureShipping
                | Self::ExcessLand
                | Self::AvailabilityDate
        )
    }

    /// Field name used in input and output documents.
    pub const fn key(self) -> &'static str {
        match self {
            Self::NetAskingRent => "net_asking_rent",
            Self::Tmi => "tmi",
            Self::ParkingRatio => "parking_ratio",
            Self::ClearHeightFt => "clear_height_ft",
            Self::PctOfficeSpace => "pct_office_space",
            Self::DistanceKm => "distance_km",
            Self::AreaDifference => "area_difference",
            Self::YearBuilt => "year_built",
            Self::BuildingClass => "building_class",
            Self::ShippingDoorsTruckLevel => "shipping_doors_truck_level",
            Self::ShippingDoorsDriveIn => "shipping_doors_drive_in",
            Self::PowerAmps => "power_amps",
            Self::TrailerParking => "trailer_parking",
            Self::SecureShipping => "secure_shipping",
            Self::ExcessLand => "excess_land",
            Self::AvailabilityDate => "availability_date",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NetAskingRent => "Net Asking Rent",
            Self::Tmi => "TMI",
            Self::ParkingRatio => "Parking Ratio",
            Self::ClearHeightFt => "Clear Height",
            Self::PctOfficeSpace => "% Office Space",
            Self::DistanceKm => "Distance",
            Self::AreaDifference => "Area Difference",
            Self::YearBuilt => "Year Built",
            Self::BuildingClass => "Building Class",
            Self::ShippingDoorsTruckLevel => "Truck-Level Doors",
            Self::ShippingDoorsDriveIn => "Drive-In Doors",
            Self::PowerAmps => "Power (Amps)",
            Self::TrailerParking => "Trailer Parking",
            Self::SecureShipping => "Secure Shipping",
            Self::ExcessLand => "Excess Land",
            Self::AvailabilityDate => "Availability",
        }
    }

    pub const fn default_direction(self) -> Direction {
        match self {
            Self::NetAskingRent
            | Self::Tmi
            | Self::DistanceKm
            | Self::AreaDifference
            | Self::BuildingClass
            | Self::PctOfficeSpace
            | Self::AvailabilityDate => Direction::LowerIsBetter,
            Self::ParkingRatio
            | Self::ClearHeightFt
            | Self::YearBuilt
            | Self::ShippingDoorsTruckLevel
            | Self::ShippingDoorsDriveIn
            | Self::PowerAmps
            | Self::TrailerParking
            | Self::SecureShipping
            | Self::ExcessLand => Direction::HigherIsBetter,
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::core()
            .into_iter()
            .chain(Self::optional())
            .find(|variable| variable.key() == normalized)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

impl Direction {
    pub const fn key(self) -> &'static str {
        match self {
            Self::LowerIsBetter => "lower_is_better",
            Self::HigherIsBetter => "higher_is_better",
        }
    }
}

/// Ordinal building class where A is the most desirable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildingClass {
    A,
    B,
    C,
}

impl BuildingClass {
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
            Self::C => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().to_ascii_uppercase();
        let cleaned = cleaned.strip_prefix("CLASS").unwrap_or(&cleaned).trim();
        match cleaned {
            "A" | "1" => Some(Self::A),
            "B" | "2" => Some(Self::B),
            "C" | "3" => Some(Self::C),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Immediate,
    On(NaiveDate),
}

impl Availability {
    /// Sortable position: immediate space sorts ahead of any dated availability.
    pub fn ordinal(self) -> f64 {
        match self {
            Self::Immediate => 0.0,
            Self::On(date) => f64::from(date.num_days_from_ce()),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => f.write_str("Immediate"),
            Self::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Address and unit; unique within a dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    pub address: String,
    pub unit: String,
}

impl RecordId {
    pub fn new(address: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            f.write_str(&self.address)
        } else {
            write!(f, "{}, unit {}", self.address, self.unit)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreAttributes {
    pub year_built: i32,
    pub clear_height_ft: f64,
    pub pct_office_space: f64,
    pub parking_ratio: f64,
    pub distance_km: f64,
    pub net_asking_rent: f64,
    pub tmi: f64,
    pub building_class: BuildingClass,
    pub available_sf: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionalAttributes {
    pub shipping_doors_truck_level: Option<u32>,
    pub shipping_doors_drive_in: Option<u32>,
    pub power_amps: Option<f64>,
    pub trailer_parking: Option<bool>,
    pub secure_shipping: Option<bool>,
    pub excess_land: Option<bool>,
    pub availability_date: Option<Availability>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub id: RecordId,
    pub landlord: Option<String>,
    pub is_subject: bool,
    pub core: CoreAttributes,
    pub optional: OptionalAttributes,
    pub area_difference: f64,
}

impl PropertyRecord {
    pub fn has(&self, variable: Variable) -> bool {
        self.value(variable).is_some()
    }

    /// Numeric value the ranking engine compares for `variable`.
    pub fn value(&self, variable: Variable) -> Option<f64> {
        let core = &self.core;
        let optional = &self.optional;
        match variable {
            Variable::NetAskingRent => Some(core.net_asking_rent),
            Variable::Tmi => Some(core.tmi),
            Variable::ParkingRatio => Some(core.parking_ratio),
            Variable::ClearHeightFt => Some(core.clear_height_ft),
            Variable::PctOfficeSpace => Some(core.pct_office_space),
            Variable::DistanceKm => Some(core.distance_km),
            Variable::AreaDifference => Some(self.area_difference),
            Variable::YearBuilt => Some(f64::from(core.year_built)),
            Variable::BuildingClass => Some(f64::from(core.building_class.ordinal())),
            Variable::ShippingDoorsTruckLevel => optional.shipping_doors_truck_level.map(f64::from),
            Variable::ShippingDoorsDriveIn => optional.shipping_doors_drive_in.map(f64::from),
            Variable::PowerAmps => optional.power_amps,
            Variable::TrailerParking => optional.trailer_parking.map(flag),
            Variable::SecureShipping => optional.secure_shipping.map(flag),
            Variable::ExcessLand => optional.excess_land.map(flag),
            Variable::AvailabilityDate => optional.availability_date.map(Availability::ordinal),
        }
    }

    /// Gross occupancy cost per square foot.
    pub fn gross_rent(&self) -> f64 {
        self.core.net_asking_rent + self.core.tmi
    }

    /// Copy of this record with different pricing; the original is left untouched.
    pub fn with_pricing(&self, net_asking_rent: f64, tmi: f64) -> Self {
        let mut repriced = self.clone();
        repriced.core.net_asking_rent = net_asking_rent;
        repriced.core.tmi = tmi;
        repriced
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Validated subject plus comparables.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationDataset {
    subject: PropertyRecord,
    comparables: Vec<PropertyRecord>,
}

impl ValuationDataset {
    pub(crate) fn new(subject: PropertyRecord, comparables: Vec<PropertyRecord>) -> Self {
        Self {
            subject,
            comparables,
        }
    }

    pub fn subject(&self) -> &PropertyRecord {
        &self.subject
    }

    pub fn comparables(&self) -> &[PropertyRecord] {
        &self.comparables
    }

    /// Subject first, then comparables in input order.
    pub fn records(&self) -> impl Iterator<Item = &PropertyRecord> {
        std::iter::once(&self.subject).chain(self.comparables.iter())
    }

    pub fn len(&self) -> usize {
        self.comparables.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn find(&self, id: &RecordId) -> Option<&PropertyRecord> {
        self.records().find(|record| &record.id == id)
    }

    pub(crate) fn with_subject(&self, subject: PropertyRecord) -> Self {
        Self {
            subject,
            comparables: self.comparables.clone(),
        }
    }
}
