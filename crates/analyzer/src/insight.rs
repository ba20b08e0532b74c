use core_types::{ElasticityClass, Segment};
use rust_decimal::Decimal;
use serde::Serialize;

/// Totals and margin of one named group (a region or a category).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub margin_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSnapshot {
    pub segment: Segment,
    pub customer_count: usize,
    pub revenue: Decimal,
    pub revenue_share_pct: Option<Decimal>,
    pub avg_revenue_per_customer: Decimal,
    pub margin_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentFinding {
    /// Frequent buyers earn a thinner margin than everybody else.
    DiscountErosion,
    /// Frequent buyers earn at least the margin of everybody else.
    PremiumPowerUser,
}

/// One structured finding.
///
/// Each variant carries all the numbers a renderer needs to write its sentence, so
/// nothing has to be recomputed downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    InsufficientData {
        reason: String,
    },
    RegionGap {
        weakest: GroupSnapshot,
        strongest: GroupSnapshot,
        gap_pct_points: Decimal,
    },
    NoRegionalVariance {
        regions: Vec<String>,
        margin_pct: Decimal,
    },
    /// The lowest-margin category inside the weakest region.
    RootCause {
        region: String,
        category: GroupSnapshot,
    },
    /// Profit unlocked if the weakest region earned the strongest region's margin
    /// on its current sales. A what-if at constant volume, not a forecast.
    OpportunityEstimate {
        region: String,
        benchmark_region: String,
        region_sales: Decimal,
        margin_gap_pct_points: Decimal,
        potential_improvement: Decimal,
        total_profit: Decimal,
        uplift_pct: Option<Decimal>,
        assumes_constant_volume: bool,
    },
    SegmentMarginGap {
        finding: SegmentFinding,
        high_frequency: SegmentSnapshot,
        standard: SegmentSnapshot,
        margin_gap_pct_points: Decimal,
    },
    SegmentInsufficientData {
        present: Vec<Segment>,
        reason: String,
    },
    BusinessHealth {
        mrr_growth_pct: Option<Decimal>,
        total_sales: Decimal,
        total_profit: Decimal,
        margin_pct: Option<Decimal>,
        customer_count: usize,
        synthetic_cac_latest: Option<Decimal>,
        synthetic_cac_improvement_pct: Option<Decimal>,
        cac_is_synthetic: bool,
    },
    TopCategory {
        category: String,
        total_profit: Decimal,
        margin_pct: Option<Decimal>,
    },
    PriceSensitivity {
        category: String,
        correlation: f64,
        classification: ElasticityClass,
    },
}

impl Insight {
    /// The serialized discriminator, handy for logging and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            Insight::InsufficientData { .. } => "insufficient_data",
            Insight::RegionGap { .. } => "region_gap",
            Insight::NoRegionalVariance { .. } => "no_regional_variance",
            Insight::RootCause { .. } => "root_cause",
            Insight::OpportunityEstimate { .. } => "opportunity_estimate",
            Insight::SegmentMarginGap { .. } => "segment_margin_gap",
            Insight::SegmentInsufficientData { .. } => "segment_insufficient_data",
            Insight::BusinessHealth { .. } => "business_health",
            Insight::TopCategory { .. } => "top_category",
            Insight::PriceSensitivity { .. } => "price_sensitivity",
        }
    }
}
