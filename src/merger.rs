//! Merges the contents of the external data file into each new record.
//!
//! A merge is a single transaction: the file is read and every value is
//! coerced before the record is touched, so any error leaves the record
//! exactly as the host handed it over.

use crate::config::FilePileSettings;
use crate::data_models::{CandidateFieldSet, RawEntry, Record};
use crate::engine::ArchiveListener;
use crate::errors::MergeError;
use crate::parsers::line_parser;
use crate::units::{StdUnitConverter, UnitConverter, UnitSystem, UNIT_SYSTEM_FIELD};
use log::{debug, error, info, warn};

/// Literal some producers write for a missing reading, besides an empty value.
const NO_READING: &str = "none";

pub struct FilePile<C = StdUnitConverter> {
    settings: FilePileSettings,
    converter: C,
}

impl FilePile<StdUnitConverter> {
    pub fn new(settings: FilePileSettings) -> Self {
        Self::with_converter(settings, StdUnitConverter)
    }
}

impl<C: UnitConverter> FilePile<C> {
    pub fn with_converter(settings: FilePileSettings, converter: C) -> Self {
        info!(
            "filepile: using {} with the '{}' unit system",
            settings.filename.display(),
            settings.unit_system
        );
        Self {
            settings,
            converter,
        }
    }

    pub fn settings(&self) -> &FilePileSettings {
        &self.settings
    }

    /// Applies the label map and numeric coercion to parsed entries.
    pub fn build_candidate(&self, entries: &[RawEntry]) -> Result<CandidateFieldSet, MergeError> {
        let mut candidate = CandidateFieldSet::default();

        for entry in entries {
            let name = self.settings.canonical_name(&entry.key);
            let value = match parse_reading(name, &entry.value) {
                Ok(value) => value,
                Err(e) if self.settings.ignore_value_error => {
                    debug!("filepile: skipping {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if name == UNIT_SYSTEM_FIELD {
                match value.map(|code| (code, UnitSystem::from_code(code))) {
                    Some((_, Some(system))) => candidate.unit_system = Some(system),
                    Some((code, None)) => {
                        let e = MergeError::UnknownUnitCode {
                            field: name.to_string(),
                            code,
                        };
                        if !self.settings.ignore_value_error {
                            return Err(e);
                        }
                        debug!("filepile: skipping {}", e);
                    }
                    None => candidate.unit_system = None,
                }
                continue;
            }

            candidate.fields.insert(name.to_string(), value);
        }

        Ok(candidate)
    }

    /// Reads the data file and merges it into `record`, returning the number
    /// of fields written. On error the record is unchanged.
    pub fn merge_into(&self, record: &mut Record) -> Result<usize, MergeError> {
        let target = record.unit_system().ok_or(MergeError::RecordUnitSystem)?;
        let entries = line_parser::read_entries(&self.settings.filename)?;
        let candidate = self.build_candidate(&entries)?;

        let source = candidate.unit_system.unwrap_or(self.settings.unit_system);
        let converted = self.converter.convert(&candidate.fields, source, target);
        let written = converted.len();
        record.update(converted);
        Ok(written)
    }

    /// Host callback for a finished archive record. Errors are logged, never
    /// propagated.
    pub fn new_archive_record(&self, record: &mut Record) {
        match self.merge_into(record) {
            Ok(written) => debug!(
                "filepile: merged {} fields from {}",
                written,
                self.settings.filename.display()
            ),
            Err(MergeError::FileAccess(e)) => error!("filepile: cannot open file. Reason: {}", e),
            Err(e @ MergeError::RecordUnitSystem) => warn!("filepile: {}", e),
            Err(e) => error!("filepile: merge skipped: {}", e),
        }
    }
}

impl<C: UnitConverter> ArchiveListener for FilePile<C> {
    fn new_archive_record(&self, record: &mut Record) {
        FilePile::new_archive_record(self, record);
    }
}

// Empty or "None" is a missing reading; anything else must be a number.
fn parse_reading(field: &str, raw: &str) -> Result<Option<f64>, MergeError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case(NO_READING) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| MergeError::ValueParse {
            field: field.to_string(),
            value: raw.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;

    fn settings(label_map: &[(&str, &str)], ignore_value_error: bool) -> FilePileSettings {
        FilePileSettings {
            filename: PathBuf::from("/nonexistent/filepile.txt"),
            unit_system: UnitSystem::Metric,
            label_map: label_map
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            ignore_value_error,
        }
    }

    fn entries(contents: &str) -> Vec<RawEntry> {
        line_parser::parse_entries(contents)
    }

    #[test]
    fn test_label_map_renames_and_passes_through() {
        let pile = FilePile::new(settings(&[("temp1", "extraTemp1")], false));
        let candidate = pile.build_candidate(&entries("temp1 = 5.0\nother = 3")).unwrap();

        assert_eq!(candidate.fields.get("extraTemp1"), Some(&Some(5.0)));
        assert_eq!(candidate.fields.get("other"), Some(&Some(3.0)));
        assert!(!candidate.fields.contains_key("temp1"));
        assert_eq!(candidate.unit_system, None);
    }

    #[test]
    fn test_empty_and_none_values_are_missing_readings() {
        let pile = FilePile::new(settings(&[], false));
        let candidate = pile.build_candidate(&entries("humid1 = \nhumid2 = None")).unwrap();

        assert_eq!(candidate.fields.get("humid1"), Some(&None));
        assert_eq!(candidate.fields.get("humid2"), Some(&None));
    }

    #[test]
    fn test_last_write_wins() {
        let pile = FilePile::new(settings(&[("b", "a")], false));
        let candidate = pile.build_candidate(&entries("a=1\na=2\nb=3")).unwrap();
        assert_eq!(candidate.fields.get("a"), Some(&Some(3.0)));
    }

    #[test]
    fn test_bad_value_aborts() {
        let pile = FilePile::new(settings(&[], false));
        let err = pile
            .build_candidate(&entries("temp1 = 1\nspeed = notanumber"))
            .unwrap_err();
        assert!(matches!(err, MergeError::ValueParse { ref field, .. } if field == "speed"));
    }

    #[test]
    fn test_bad_value_skipped_when_ignored() {
        let pile = FilePile::new(settings(&[], true));
        let candidate = pile
            .build_candidate(&entries("temp1 = 1\nspeed = notanumber"))
            .unwrap();
        assert_eq!(candidate.fields.get("temp1"), Some(&Some(1.0)));
        assert!(!candidate.fields.contains_key("speed"));
    }

    #[test]
    fn test_explicit_unit_system() {
        let pile = FilePile::new(settings(&[("units", "usUnits")], false));

        let candidate = pile.build_candidate(&entries("usUnits = 1\noutTemp = 70")).unwrap();
        assert_eq!(candidate.unit_system, Some(UnitSystem::Us));
        assert!(!candidate.fields.contains_key(UNIT_SYSTEM_FIELD));

        let mapped = pile.build_candidate(&entries("units = 17")).unwrap();
        assert_eq!(mapped.unit_system, Some(UnitSystem::MetricWx));

        let blank = pile.build_candidate(&entries("usUnits =")).unwrap();
        assert_eq!(blank.unit_system, None);
    }

    #[test]
    fn test_unknown_unit_code() {
        let strict = FilePile::new(settings(&[], false));
        assert!(matches!(
            strict.build_candidate(&entries("usUnits = 5")),
            Err(MergeError::UnknownUnitCode { .. })
        ));

        let lenient = FilePile::new(settings(&[], true));
        let candidate = lenient.build_candidate(&entries("usUnits = 5\noutTemp = 20")).unwrap();
        assert_eq!(candidate.unit_system, None);
        assert_eq!(candidate.fields.get("outTemp"), Some(&Some(20.0)));
    }

    struct RecordingConverter {
        seen: std::cell::RefCell<Vec<(UnitSystem, UnitSystem)>>,
    }

    impl UnitConverter for RecordingConverter {
        fn convert(
            &self,
            fields: &BTreeMap<String, Option<f64>>,
            from: UnitSystem,
            to: UnitSystem,
        ) -> BTreeMap<String, Option<f64>> {
            self.seen.borrow_mut().push((from, to));
            let mut out = fields.clone();
            out.insert(UNIT_SYSTEM_FIELD.to_string(), Some(f64::from(to.code())));
            out
        }
    }

    #[test]
    fn test_record_without_unit_system_is_untouched() {
        let converter = RecordingConverter {
            seen: Default::default(),
        };
        let pile = FilePile::with_converter(settings(&[], false), converter);
        let mut record = Record::default();
        record.insert("outTemp", Some(20.0));
        let before = record.clone();

        assert!(matches!(
            pile.merge_into(&mut record),
            Err(MergeError::RecordUnitSystem)
        ));
        assert_eq!(record, before);
        assert!(pile.converter.seen.borrow().is_empty());
    }

    #[test]
    fn test_missing_file_leaves_record_untouched() {
        let pile = FilePile::new(settings(&[], false));
        let mut record = Record::new(UnitSystem::Us);
        record.insert("outTemp", Some(68.0));
        let before = record.clone();

        assert!(matches!(
            pile.merge_into(&mut record),
            Err(MergeError::FileAccess(_))
        ));
        pile.new_archive_record(&mut record);
        assert_eq!(record, before);
    }
}
