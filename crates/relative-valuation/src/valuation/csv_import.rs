use super::loader::RawPropertyRecord;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug)]
pub enum ComparableImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, source: serde_json::Error },
}

impl std::fmt::Display for ComparableImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparableImportError::Io(err) => write!(f, "failed to read comparables CSV: {}", err),
            ComparableImportError::Csv(err) => write!(f, "invalid comparables CSV data: {}", err),
            ComparableImportError::Row { line, source } => {
                write!(f, "comparables CSV line {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for ComparableImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ComparableImportError::Io(err) => Some(err),
            ComparableImportError::Csv(err) => Some(err),
            ComparableImportError::Row { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for ComparableImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ComparableImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads comparables exported as CSV, one record per row, headers named
/// after the record fields. Blank cells are treated as absent.
pub struct ComparableCsvImporter;

impl ComparableCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<RawPropertyRecord>, ComparableImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RawPropertyRecord>, ComparableImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();

        for row in csv_reader.records() {
            let row = row?;
            let line = row.position().map(|position| position.line()).unwrap_or_default();
            let fields: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(header, value)| (header.clone(), Value::String(value.to_string())))
                .collect();
            let record = serde_json::from_value(Value::Object(fields))
                .map_err(|source| ComparableImportError::Row { line, source })?;
            records.push(record);
        }

        debug!(rows = records.len(), "comparables imported from CSV");
        Ok(records)
    }
}

fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}
