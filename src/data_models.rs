use crate::units::{UnitSystem, UNIT_SYSTEM_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `key = value` assignment as it appeared in the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub value: String, // Empty means "no reading"
}

impl RawEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Fields gathered from one read of the data file, keyed by canonical name.
///
/// All values are in `unit_system`. `None` there means the file did not say,
/// and the configured default applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFieldSet {
    pub fields: BTreeMap<String, Option<f64>>,
    pub unit_system: Option<UnitSystem>,
}

/// The observation record for one cycle. Owned by the host; values of `None`
/// are missing readings and serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Option<f64>>,
}

impl Record {
    pub fn new(unit_system: UnitSystem) -> Self {
        let mut record = Self::default();
        record.insert(UNIT_SYSTEM_FIELD, Some(f64::from(unit_system.code())));
        record
    }

    /// The record's unit system, if `usUnits` holds a known code.
    pub fn unit_system(&self) -> Option<UnitSystem> {
        self.get(UNIT_SYSTEM_FIELD).and_then(UnitSystem::from_code)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<f64>) {
        self.fields.insert(name.into(), value);
    }

    /// Sets every given field, leaving all other fields as they were.
    pub fn update<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        self.fields.extend(fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<f64>)> {
        self.fields.iter()
    }
}
