use crate::domain::model::FlatRow;
use crate::utils::error::{PredictError, Result};
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("valid number pattern")
});

/// Parses header-driven CSV into rows in file order, typing each cell.
///
/// Blank lines are skipped. A row shorter than the header simply lacks the
/// trailing keys; cells beyond the header are dropped.
pub fn parse_rows(data: &[u8], delimiter: u8) -> Result<Vec<FlatRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if headers.len() == 1 {
        return Err(PredictError::SingleColumnError {
            header: headers.get(0).unwrap_or_default().to_string(),
        });
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            tracing::warn!(
                "Row {} has {} cells but only {} columns; extra cells ignored",
                index,
                record.len(),
                headers.len()
            );
        }

        let row: FlatRow = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.to_string(), typed_cell(cell)))
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(PredictError::EmptyInputError);
    }

    tracing::debug!("Parsed {} rows with {} columns", rows.len(), headers.len());
    Ok(rows)
}

/// Empty → null, `true`/`false` → bool, decimal → number, else string.
pub fn typed_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if NUMBER_PATTERN.is_match(cell) {
        let trimmed = cell.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::from(int);
        }
        if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}
