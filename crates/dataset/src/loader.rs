use crate::columns::ColumnMap;
use crate::error::DatasetError;
use crate::imputation::{impute, CleanedDataset, RawTransaction};
use chrono::NaiveDate;
use configuration::DatasetParams;
use rust_decimal::prelude::*;
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

/// Values treated as "missing" in numeric columns, compared case-insensitively.
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none"];

/// Loads and cleans a transaction ledger from a CSV file.
pub fn load_csv(path: &Path, params: &DatasetParams) -> Result<CleanedDataset, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "Loading transaction ledger.");
    load_from_reader(file, params)
}

/// Loads and cleans a transaction ledger from any CSV reader.
///
/// The header row is validated before any data row is read: a missing required
/// column aborts the load. A field that is not valid UTF-8 is read as latin-1, the
/// encoding of legacy spreadsheet exports.
pub fn load_from_reader<R: Read>(reader: R, params: &DatasetParams) -> Result<CleanedDataset, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|h| decode_field(h).into_owned())
        .collect();
    let columns = ColumnMap::resolve(headers.iter().map(String::as_str))?;

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.byte_records().enumerate() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
        rows.push(parse_row(&record, &columns, line, &params.date_formats)?);
    }

    let dataset = impute(rows, &params.imputation)?;
    tracing::info!(
        records = dataset.records.len(),
        warnings = dataset.warnings.len(),
        "Ledger loaded."
    );
    Ok(dataset)
}

fn parse_row(
    record: &csv::ByteRecord,
    columns: &ColumnMap,
    line: usize,
    date_formats: &[String],
) -> Result<RawTransaction, DatasetError> {
    let field = |idx: usize| -> Cow<'_, str> {
        record.get(idx).map(decode_field).unwrap_or(Cow::Borrowed(""))
    };
    let invalid = |reason: String| DatasetError::InvalidRow { line, reason };

    let raw_date = field(columns.date);
    let date = parse_date(&raw_date, date_formats)
        .ok_or_else(|| invalid(format!("unrecognised date '{}'", raw_date)))?;

    let required = |idx: usize, name: &str| -> Result<String, DatasetError> {
        let value = field(idx);
        if is_missing(&value) {
            return Err(invalid(format!("required field '{}' is empty", name)));
        }
        Ok(value.into_owned())
    };

    let region = required(columns.region, "region")?;
    let product_category = required(columns.product_category, "product_category")?;
    let customer_id = required(columns.customer_id, "customer_id")?;

    let sales_amount = parse_decimal(&field(columns.sales_amount))
        .map_err(|raw| invalid(format!("invalid sales_amount '{}'", raw)))?;
    if matches!(sales_amount, Some(v) if v < Decimal::ZERO) {
        return Err(invalid("sales_amount must be non-negative".to_string()));
    }
    let profit = parse_decimal(&field(columns.profit))
        .map_err(|raw| invalid(format!("invalid profit '{}'", raw)))?;
    let quantity = parse_quantity(&field(columns.quantity))
        .map_err(|raw| invalid(format!("invalid quantity '{}' (expected a non-negative integer)", raw)))?;

    Ok(RawTransaction {
        line,
        date,
        region,
        product_category,
        customer_id,
        sales_amount,
        profit,
        quantity,
    })
}

/// Decodes one CSV field as UTF-8, falling back to latin-1 byte-for-char.
///
/// Latin-1 maps every byte to a distinct code point, so different labels stay
/// different after decoding.
fn decode_field(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    MISSING_MARKERS.iter().any(|m| value.eq_ignore_ascii_case(m))
}

fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Parses an optional currency value. `Ok(None)` means the cell was blank.
fn parse_decimal(value: &str) -> Result<Option<Decimal>, String> {
    if is_missing(value) {
        return Ok(None);
    }
    let cleaned: String = value.trim().chars().filter(|c| *c != ',' && *c != '$').collect();
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(Some)
        .map_err(|_| value.to_string())
}

fn parse_quantity(value: &str) -> Result<Option<u32>, String> {
    match parse_decimal(value)? {
        None => Ok(None),
        Some(v) if v.fract().is_zero() => v.to_u32().map(Some).ok_or_else(|| value.to_string()),
        Some(_) => Err(value.to_string()),
    }
}
