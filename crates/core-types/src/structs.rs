use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;

/// A calendar month bucket. Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One row of the sales ledger.
///
/// Records are immutable once built. The calendar buckets and the profit margin
/// are derived a single time in [`TransactionRecord::new`] so every consumer sees
/// the same values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    date: NaiveDate,
    region: String,
    product_category: String,
    customer_id: String,
    sales_amount: Decimal,
    profit: Decimal,
    quantity: u32,

    // Derived
    month: YearMonth,
    quarter: u32,
    year: i32,
    profit_margin: Option<Decimal>, // None when sales_amount is zero
}

impl TransactionRecord {
    pub fn new(
        date: NaiveDate,
        region: impl Into<String>,
        product_category: impl Into<String>,
        customer_id: impl Into<String>,
        sales_amount: Decimal,
        profit: Decimal,
        quantity: u32,
    ) -> Result<Self, CoreError> {
        let region = require_label("region", region.into())?;
        let product_category = require_label("product_category", product_category.into())?;
        let customer_id = require_label("customer_id", customer_id.into())?;

        if sales_amount < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "sales_amount".to_string(),
                format!("must be non-negative, got {}", sales_amount),
            ));
        }

        Ok(Self {
            date,
            region,
            product_category,
            customer_id,
            sales_amount,
            profit,
            quantity,
            month: YearMonth::from_date(date),
            quarter: (date.month() - 1) / 3 + 1,
            year: date.year(),
            profit_margin: percentage(profit, sales_amount),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn product_category(&self) -> &str {
        &self.product_category
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn sales_amount(&self) -> Decimal {
        self.sales_amount
    }

    pub fn profit(&self) -> Decimal {
        self.profit
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// Calendar quarter, 1 through 4.
    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Profit as a percentage of the sales amount, `None` for a zero-value sale.
    pub fn profit_margin(&self) -> Option<Decimal> {
        self.profit_margin
    }
}

fn require_label(field: &str, value: String) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Expresses `numerator / denominator` as a percentage.
///
/// Returns `None` when the ratio is undefined (zero denominator) or does not fit
/// in a `Decimal`. Zero is a valid, distinct result and is never used as a stand-in.
pub fn percentage(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator
        .checked_div(denominator)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
