use crate::data_models::RawEntry;
use crate::errors::ParseError;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const DELIMITER: char = '=';

/// Splits file contents into `key = value` entries, in file order.
/// Lines without a delimiter are skipped. Only the first `=` splits.
pub fn parse_entries(contents: &str) -> Vec<RawEntry> {
    contents
        .lines()
        .filter_map(|line| line.split_once(DELIMITER))
        .map(|(key, value)| RawEntry::new(key.trim(), value.trim()))
        .collect()
}

/// Reads and parses the data file at `path`.
pub fn read_entries(path: &Path) -> Result<Vec<RawEntry>, ParseError> {
    let bytes = fs::read(path).map_err(|e| ParseError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    // Invalid UTF-8 is replaced instead of failing the whole file
    let contents = String::from_utf8_lossy(&bytes);
    Ok(parse_entries(&contents))
}

/// Collapses entries into a map; later duplicates win.
pub fn to_map(entries: &[RawEntry]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.clone()))
        .collect()
}
