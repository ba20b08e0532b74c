//! # Sales Insights Dataset Crate
//!
//! This crate is the "Cleaned Dataset Provider": it turns a raw sales ledger into the
//! validated, immutable `TransactionRecord`s the analysis crates consume.
//!
//! ## Responsibilities
//!
//! - **Column resolution:** headers are normalized and matched against known aliases
//!   (`Order Date`, `Customer ID`, `Sales`, ...). A missing required column is a
//!   configuration error and stops the load before any row is parsed.
//! - **Declared imputation:** missing sales, profit and quantity values are filled
//!   with the business rules from `configuration::ImputationParams`. Every rule that
//!   fires is reported as a `DataQualityWarning`; nothing is filled silently.
//!
//! ## Public API
//!
//! - `load_csv` / `load_from_reader`: read and clean a ledger.
//! - `impute`: clean rows that were obtained some other way.
//! - `CleanedDataset`, `DataQualityWarning`, `DatasetError`.

pub mod columns;
pub mod error;
pub mod imputation;
pub mod loader;

pub use error::DatasetError;
pub use imputation::{
    impute, CleanedDataset, DataQualityWarning, ImputationMethod, ImputedField, RawTransaction,
};
pub use loader::{load_csv, load_from_reader};
