//! # Sales Insights Analytics Engines
//!
//! This crate turns the cleaned transaction ledger into numbers: revenue series,
//! margins, customer segments and price sensitivity.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O and no knowledge of where records come from. It depends
//!   only on `core-types` and on the parameter structs from `configuration`.
//! - **Stateless calculators:** each engine is built once from validated parameters
//!   and then maps `&[TransactionRecord]` to a report. The engines share no state,
//!   so they can run side by side over the same slice.
//! - **Undefined is not zero:** ratios with a zero denominator are `None` and are
//!   reported as a `Diagnostic` next to the result.
//!
//! ## Public API
//!
//! - `MetricsEngine` -> `MetricsReport` (monthly revenue, growth, synthetic CAC,
//!   regional margins, category performance).
//! - `SegmentationEngine` -> `SegmentationReport` (customer profiles, segment stats).
//! - `ElasticityEstimator` -> `ElasticityReport` (price/volume correlation per category).
//! - `Diagnostic`: non-fatal conditions raised while calculating.

pub mod diagnostics;
pub mod elasticity;
pub mod error;
pub mod metrics;
pub mod segmentation;
pub mod stats;

pub use diagnostics::{Diagnostic, UndefinedMetric};
pub use elasticity::{ElasticityEstimator, ElasticityReport, ElasticityResult};
pub use error::AnalyticsError;
pub use metrics::{
    category_performance, CacPoint, CacTrend, CategoryPerformance, MetricsEngine, MetricsReport,
    MonthlyMetric, RegionalMargin, SyntheticCac,
};
pub use segmentation::{CustomerProfile, SegmentStats, SegmentationEngine, SegmentationReport};
