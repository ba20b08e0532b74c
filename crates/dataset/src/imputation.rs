//! Declared imputation rules for missing numeric values.
//!
//! Each rule is a stated business approximation. Whenever one fires, a
//! [`DataQualityWarning`] describing the field, the method, the number of rows and
//! the total amount filled in is handed back with the cleaned records.

use crate::error::DatasetError;
use chrono::NaiveDate;
use configuration::ImputationParams;
use core_types::TransactionRecord;
use rust_decimal::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A ledger row as read from the source, before imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTransaction {
    /// Source line number, used in error messages and warnings.
    pub line: usize,
    pub date: NaiveDate,
    pub region: String,
    pub product_category: String,
    pub customer_id: String,
    pub sales_amount: Option<Decimal>,
    pub profit: Option<Decimal>,
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImputedField {
    SalesAmount,
    Profit,
    Quantity,
}

impl fmt::Display for ImputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputedField::SalesAmount => write!(f, "sales_amount"),
            ImputedField::Profit => write!(f, "profit"),
            ImputedField::Quantity => write!(f, "quantity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ImputationMethod {
    /// Median of the observed values within the record's product category.
    CategoryMedian,
    /// Median of the observed values across the whole dataset.
    DatasetMedian,
    /// A fixed fraction of the record's sales amount.
    FlatMarginOfSales { margin: Decimal },
}

impl fmt::Display for ImputationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputationMethod::CategoryMedian => write!(f, "per-category median"),
            ImputationMethod::DatasetMedian => write!(f, "dataset-wide median"),
            ImputationMethod::FlatMarginOfSales { margin } => write!(
                f,
                "flat {}% of sales amount",
                (*margin * Decimal::ONE_HUNDRED).normalize()
            ),
        }
    }
}

/// A non-fatal note that some values in the output were filled in rather than observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityWarning {
    pub field: ImputedField,
    pub method: ImputationMethod,
    pub rows_affected: usize,
    /// Sum of all imputed values for this field and method.
    pub imputed_total: Decimal,
    /// Source line numbers of the affected rows.
    pub lines: Vec<usize>,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} missing on {} row(s), filled with {} (business-rule approximation, not a measured value); imputed total {}",
            self.field,
            self.rows_affected,
            self.method,
            self.imputed_total.round_dp(2)
        )
    }
}

/// The ledger after cleaning: every record fully populated, plus a report of
/// what had to be filled in.
#[derive(Debug, Clone, Default)]
pub struct CleanedDataset {
    pub records: Vec<TransactionRecord>,
    pub warnings: Vec<DataQualityWarning>,
}

impl CleanedDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Accumulates the rows touched by one (field, method) rule.
struct WarningBuilder {
    field: ImputedField,
    method: ImputationMethod,
    lines: Vec<usize>,
    total: Decimal,
}

impl WarningBuilder {
    fn new(field: ImputedField, method: ImputationMethod) -> Self {
        Self { field, method, lines: Vec::new(), total: Decimal::ZERO }
    }

    fn record(&mut self, line: usize, value: Decimal) {
        self.lines.push(line);
        self.total += value;
    }

    fn finish(self) -> Option<DataQualityWarning> {
        if self.lines.is_empty() {
            return None;
        }
        let warning = DataQualityWarning {
            field: self.field,
            method: self.method,
            rows_affected: self.lines.len(),
            imputed_total: self.total,
            lines: self.lines,
        };
        tracing::warn!(%warning, "Imputed missing values.");
        Some(warning)
    }
}

/// Fills missing numeric values and builds immutable `TransactionRecord`s.
///
/// Order matters: sales amounts are filled first so a missing profit can be
/// derived from the (possibly imputed) sales amount of the same row.
pub fn impute(
    rows: Vec<RawTransaction>,
    params: &ImputationParams,
) -> Result<CleanedDataset, DatasetError> {
    let sales_fill = SalesFill::from_rows(&rows, params.sales_by_category_median);
    let quantity_fill = median_quantity(&rows);

    let mut by_category = WarningBuilder::new(ImputedField::SalesAmount, ImputationMethod::CategoryMedian);
    let mut by_dataset = WarningBuilder::new(ImputedField::SalesAmount, ImputationMethod::DatasetMedian);
    let mut profit_rule = WarningBuilder::new(
        ImputedField::Profit,
        ImputationMethod::FlatMarginOfSales { margin: params.profit_fallback_margin },
    );
    let mut quantity_rule = WarningBuilder::new(ImputedField::Quantity, ImputationMethod::DatasetMedian);

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let sales_amount = match row.sales_amount {
            Some(value) => value,
            None => {
                let (value, method) = sales_fill
                    .for_category(&row.product_category)
                    .ok_or(DatasetError::NoUsableValues("sales_amount"))?;
                match method {
                    ImputationMethod::CategoryMedian => by_category.record(row.line, value),
                    _ => by_dataset.record(row.line, value),
                }
                value
            }
        };

        let profit = match row.profit {
            Some(value) => value,
            None => {
                let value = sales_amount * params.profit_fallback_margin;
                profit_rule.record(row.line, value);
                value
            }
        };

        let quantity = match row.quantity {
            Some(value) => value,
            None => {
                let value = quantity_fill.ok_or(DatasetError::NoUsableValues("quantity"))?;
                quantity_rule.record(row.line, Decimal::from(value));
                value
            }
        };

        let record = TransactionRecord::new(
            row.date,
            row.region,
            row.product_category,
            row.customer_id,
            sales_amount,
            profit,
            quantity,
        )
        .map_err(|source| DatasetError::Record { line: row.line, source })?;
        records.push(record);
    }

    let warnings = [by_category, by_dataset, profit_rule, quantity_rule]
        .into_iter()
        .filter_map(WarningBuilder::finish)
        .collect();

    Ok(CleanedDataset { records, warnings })
}

/// Lookup of replacement sales amounts.
struct SalesFill {
    by_category: HashMap<String, Decimal>,
    dataset: Option<Decimal>,
}

impl SalesFill {
    fn from_rows(rows: &[RawTransaction], per_category: bool) -> Self {
        let mut observed: HashMap<&str, Vec<Decimal>> = HashMap::new();
        let mut all = Vec::new();
        for row in rows {
            if let Some(value) = row.sales_amount {
                all.push(value);
                if per_category {
                    observed.entry(row.product_category.as_str()).or_default().push(value);
                }
            }
        }

        let by_category = observed
            .into_iter()
            .filter_map(|(category, mut values)| {
                median(&mut values).map(|m| (category.to_string(), m))
            })
            .collect();

        Self { by_category, dataset: median(&mut all) }
    }

    fn for_category(&self, category: &str) -> Option<(Decimal, ImputationMethod)> {
        if let Some(value) = self.by_category.get(category) {
            return Some((*value, ImputationMethod::CategoryMedian));
        }
        self.dataset.map(|value| (value, ImputationMethod::DatasetMedian))
    }
}

fn median_quantity(rows: &[RawTransaction]) -> Option<u32> {
    let mut observed: Vec<Decimal> = rows.iter().filter_map(|r| r.quantity).map(Decimal::from).collect();
    median(&mut observed)?.round().to_u32()
}

/// Median with the midpoint of the two central values for even-sized inputs.
pub fn median(values: &mut [Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / Decimal::TWO)
    } else {
        Some(values[mid])
    }
}
