use core_types::Segment;
use serde::Serialize;
use std::fmt;

/// A non-fatal condition observed while computing metrics.
///
/// Diagnostics travel next to the normal outputs so the insight generator and the
/// renderer can tell "undefined" and "not enough data" apart from a real zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The ledger contained no records at all.
    EmptyDataset,
    /// Only one region has a defined margin, so there is nothing to compare against.
    SingleRegion { region: String },
    /// Every customer fell into the same segment.
    SingleSegment { segment: Segment },
    /// A category had too few usable date-points for a correlation.
    SparseCategory { category: String, date_points: usize, required_more_than: usize },
    /// A ratio had a zero denominator and was left undefined.
    ArithmeticUndefined { metric: UndefinedMetric, subject: String },
}

/// The ratio that could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedMetric {
    /// Previous month had zero revenue.
    GrowthRate,
    /// Group had zero sales.
    Margin,
    /// Day had zero units sold.
    AveragePrice,
    /// Price or volume never varied.
    Correlation,
    /// Combined revenue of all segments was zero.
    RevenueShare,
    /// Total profit across regions was zero.
    ProfitUplift,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EmptyDataset => write!(f, "dataset is empty"),
            Diagnostic::SingleRegion { region } => {
                write!(f, "only one comparable region ({region}); regional gap is zero")
            }
            Diagnostic::SingleSegment { segment } => {
                write!(f, "all customers fall into the {segment} segment")
            }
            Diagnostic::SparseCategory { category, date_points, required_more_than } => write!(
                f,
                "{category}: {date_points} date-point(s), more than {required_more_than} needed for elasticity"
            ),
            Diagnostic::ArithmeticUndefined { metric, subject } => {
                write!(f, "{metric:?} undefined for {subject} (zero denominator)")
            }
        }
    }
}
