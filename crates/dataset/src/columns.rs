//! Header normalization for the ledger's columns.
//!
//! Exports from different tools spell the same column differently ("Order Date",
//! "order_date", "Customer ID", "Sales"). Headers are reduced to lowercase
//! alphanumerics and matched against a small alias table.

use crate::error::DatasetError;
use std::collections::HashMap;

/// A required column together with the normalized spellings accepted for it,
/// in order of preference.
struct ColumnSpec {
    name: &'static str,
    aliases: &'static [&'static str],
}

const DATE: ColumnSpec = ColumnSpec { name: "date", aliases: &["date", "orderdate", "transactiondate"] };
const REGION: ColumnSpec = ColumnSpec { name: "region", aliases: &["region"] };
const CATEGORY: ColumnSpec = ColumnSpec {
    name: "product_category",
    aliases: &["productcategory", "category"],
};
const CUSTOMER: ColumnSpec = ColumnSpec { name: "customer_id", aliases: &["customerid", "customer"] };
const SALES: ColumnSpec = ColumnSpec { name: "sales_amount", aliases: &["salesamount", "sales"] };
const PROFIT: ColumnSpec = ColumnSpec { name: "profit", aliases: &["profit"] };
const QUANTITY: ColumnSpec = ColumnSpec { name: "quantity", aliases: &["quantity", "qty"] };

/// Reduces a raw header to its comparable form: trimmed, lowercase, alphanumerics only.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Positions of every required column within a CSV record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub region: usize,
    pub product_category: usize,
    pub customer_id: usize,
    pub sales_amount: usize,
    pub profit: usize,
    pub quantity: usize,
}

impl ColumnMap {
    /// Resolves all required columns from the header row.
    ///
    /// Fails on the first required column that has no matching header; nothing is
    /// parsed in that case.
    pub fn resolve<'a, I>(headers: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raw: Vec<&str> = headers.into_iter().collect();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (idx, header) in raw.iter().enumerate() {
            // The first occurrence of a duplicated header wins.
            positions.entry(normalize_header(header)).or_insert(idx);
        }

        let find = |spec: &ColumnSpec| -> Result<usize, DatasetError> {
            spec.aliases
                .iter()
                .find_map(|alias| positions.get(*alias).copied())
                .ok_or_else(|| DatasetError::MissingColumn {
                    column: spec.name,
                    available: raw.join(", "),
                })
        };

        Ok(Self {
            date: find(&DATE)?,
            region: find(&REGION)?,
            product_category: find(&CATEGORY)?,
            customer_id: find(&CUSTOMER)?,
            sales_amount: find(&SALES)?,
            profit: find(&PROFIT)?,
            quantity: find(&QUANTITY)?,
        })
    }
}
