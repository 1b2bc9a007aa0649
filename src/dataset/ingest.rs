//! Delimited-text adapter for [`RawTable`].
//!
//! Ingestion proper (locating files, querying databases) belongs to the caller.
//! This adapter only turns already-located CSV text into the table shape the
//! pipeline consumes. An empty field becomes [`Value::Missing`]; a field that
//! parses as a finite number becomes [`Value::Number`]; anything else is text.

use super::{Column, RawTable, Value};
use crate::preprocessing::error::PreprocessingError;
use std::io::Read;
use std::path::Path;

fn parse_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Missing;
    }
    match field.parse::<f64>() {
        Ok(x) if x.is_finite() => Value::Number(x),
        _ => Value::Text(field.to_string()),
    }
}

impl RawTable {
    /// Read a table from CSV text with a header row.
    ///
    /// # Errors
    /// - [`PreprocessingError::CsvError`] for malformed or ragged records
    /// - [`PreprocessingError::EmptyDataset`] if there are no data rows
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PreprocessingError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

        for record in rdr.records() {
            let record = record?;
            for (col, field) in record.iter().enumerate() {
                columns[col].push(parse_field(field));
            }
        }

        if columns.first().map_or(true, Vec::is_empty) {
            return Err(PreprocessingError::EmptyDataset(
                "CSV input has no data rows".to_string(),
            ));
        }

        RawTable::new(
            headers
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Read a table from a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }
}
