//! Unit systems and the standard unit conversion service.
//!
//! Records carry a `usUnits` code naming the unit system all of their values
//! are expressed in. Conversion between systems works per observation: the
//! observation name selects a unit group, the group selects a concrete unit
//! for each system, and values are mapped through that group's base unit.

use crate::errors::ConfigError;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Name of the record field holding the unit system code.
pub const UNIT_SYSTEM_FIELD: &str = "usUnits";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitSystem {
    Us,
    Metric,
    MetricWx,
}

impl UnitSystem {
    pub const fn code(self) -> u8 {
        match self {
            UnitSystem::Us => 1,
            UnitSystem::Metric => 16,
            UnitSystem::MetricWx => 17,
        }
    }

    /// Maps a numeric `usUnits` value back to a unit system. Non-integral
    /// values never match.
    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(UnitSystem::Us),
            c if c == 16.0 => Some(UnitSystem::Metric),
            c if c == 17.0 => Some(UnitSystem::MetricWx),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            UnitSystem::Us => "US",
            UnitSystem::Metric => "METRIC",
            UnitSystem::MetricWx => "METRICWX",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitSystem {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "US" => Ok(UnitSystem::Us),
            "METRIC" => Ok(UnitSystem::Metric),
            "METRICWX" => Ok(UnitSystem::MetricWx),
            _ => Err(ConfigError::UnknownUnitSystem {
                name: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitGroup {
    Temperature,
    Pressure,
    Rain,
    RainRate,
    Speed,
    Altitude,
    Distance,
}

impl UnitGroup {
    /// The unit this group is measured in under `system`.
    pub fn unit_for(self, system: UnitSystem) -> Unit {
        use UnitSystem::*;
        match (self, system) {
            (UnitGroup::Temperature, Us) => Unit::DegreeF,
            (UnitGroup::Temperature, Metric | MetricWx) => Unit::DegreeC,
            (UnitGroup::Pressure, Us) => Unit::InHg,
            (UnitGroup::Pressure, Metric | MetricWx) => Unit::Mbar,
            (UnitGroup::Rain, Us) => Unit::Inch,
            (UnitGroup::Rain, Metric) => Unit::Cm,
            (UnitGroup::Rain, MetricWx) => Unit::Mm,
            (UnitGroup::RainRate, Us) => Unit::InchPerHour,
            (UnitGroup::RainRate, Metric) => Unit::CmPerHour,
            (UnitGroup::RainRate, MetricWx) => Unit::MmPerHour,
            (UnitGroup::Speed, Us) => Unit::MilePerHour,
            (UnitGroup::Speed, Metric) => Unit::KmPerHour,
            (UnitGroup::Speed, MetricWx) => Unit::MeterPerSecond,
            (UnitGroup::Altitude, Us) => Unit::Foot,
            (UnitGroup::Altitude, Metric | MetricWx) => Unit::Meter,
            (UnitGroup::Distance, Us) => Unit::Mile,
            (UnitGroup::Distance, Metric | MetricWx) => Unit::Km,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    DegreeF,
    DegreeC,
    InHg,
    Mbar,
    Inch,
    Cm,
    Mm,
    InchPerHour,
    CmPerHour,
    MmPerHour,
    MilePerHour,
    KmPerHour,
    MeterPerSecond,
    Foot,
    Meter,
    Mile,
    Km,
}

impl Unit {
    // (scale, offset) such that base = value * scale + offset.
    // Bases: degree_C, mbar, mm, mm_per_hour, meter_per_second, meter, km.
    fn to_base(self) -> (f64, f64) {
        match self {
            Unit::DegreeF => (5.0 / 9.0, -32.0 * 5.0 / 9.0),
            Unit::DegreeC => (1.0, 0.0),
            Unit::InHg => (33.863_886_666_7, 0.0),
            Unit::Mbar => (1.0, 0.0),
            Unit::Inch => (25.4, 0.0),
            Unit::Cm => (10.0, 0.0),
            Unit::Mm => (1.0, 0.0),
            Unit::InchPerHour => (25.4, 0.0),
            Unit::CmPerHour => (10.0, 0.0),
            Unit::MmPerHour => (1.0, 0.0),
            Unit::MilePerHour => (0.447_04, 0.0),
            Unit::KmPerHour => (1.0 / 3.6, 0.0),
            Unit::MeterPerSecond => (1.0, 0.0),
            Unit::Foot => (0.3048, 0.0),
            Unit::Meter => (1.0, 0.0),
            Unit::Mile => (1.609_344, 0.0),
            Unit::Km => (1.0, 0.0),
        }
    }
}

/// Converts a single value between two units of the same group.
pub fn convert_value(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }
    let (from_scale, from_offset) = from.to_base();
    let (to_scale, to_offset) = to.to_base();
    let base = value * from_scale + from_offset;
    (base - to_offset) / to_scale
}

static OBS_GROUPS: Lazy<HashMap<&'static str, UnitGroup>> = Lazy::new(|| {
    use UnitGroup::*;
    HashMap::from([
        ("outTemp", Temperature),
        ("inTemp", Temperature),
        ("dewpoint", Temperature),
        ("inDewpoint", Temperature),
        ("windchill", Temperature),
        ("heatindex", Temperature),
        ("appTemp", Temperature),
        ("humidex", Temperature),
        ("barometer", Pressure),
        ("pressure", Pressure),
        ("altimeter", Pressure),
        ("rain", Rain),
        ("hail", Rain),
        ("ET", Rain),
        ("snow", Rain),
        ("rainRate", RainRate),
        ("hailRate", RainRate),
        ("windSpeed", Speed),
        ("windGust", Speed),
        ("windSpeed10", Speed),
        ("altitude", Altitude),
        ("cloudbase", Altitude),
        ("windrun", Distance),
    ])
});

// Numbered sensor families, e.g. extraTemp1 .. extraTempN.
const NUMBERED_TEMPERATURES: [&str; 3] = ["extraTemp", "soilTemp", "leafTemp"];

/// Looks up the unit group of an observation. `None` means the value has no
/// unit that differs between systems.
pub fn obs_group(name: &str) -> Option<UnitGroup> {
    if let Some(group) = OBS_GROUPS.get(name) {
        return Some(*group);
    }
    NUMBERED_TEMPERATURES
        .iter()
        .filter_map(|prefix| name.strip_prefix(prefix))
        .any(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .then_some(UnitGroup::Temperature)
}

/// Converts a mapping of named quantities between unit systems.
pub trait UnitConverter {
    /// The result always carries `usUnits` set to `to`.
    fn convert(
        &self,
        fields: &BTreeMap<String, Option<f64>>,
        from: UnitSystem,
        to: UnitSystem,
    ) -> BTreeMap<String, Option<f64>>;
}

/// Group-table based converter covering the common weather observations.
/// Unknown observations and missing readings pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdUnitConverter;

impl UnitConverter for StdUnitConverter {
    fn convert(
        &self,
        fields: &BTreeMap<String, Option<f64>>,
        from: UnitSystem,
        to: UnitSystem,
    ) -> BTreeMap<String, Option<f64>> {
        let mut converted: BTreeMap<String, Option<f64>> = fields
            .iter()
            .map(|(name, value)| {
                let value = match (value, obs_group(name)) {
                    (Some(v), Some(group)) if from != to => {
                        Some(convert_value(*v, group.unit_for(from), group.unit_for(to)))
                    }
                    _ => *value,
                };
                (name.clone(), value)
            })
            .collect();
        converted.insert(UNIT_SYSTEM_FIELD.to_string(), Some(f64::from(to.code())));
        converted
    }
}
