use analytics::{
    category_performance, Diagnostic, ElasticityReport, MetricsReport, SegmentationReport,
    UndefinedMetric,
};
use core_types::{percentage, Segment, TransactionRecord};
use rust_decimal::Decimal;
use std::cmp::Ordering;

pub mod insight;

pub use insight::{GroupSnapshot, Insight, SegmentFinding, SegmentSnapshot};

/// The ordered findings plus the conditions met while producing them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A deterministic rule pipeline over the engine outputs.
///
/// Every step is a pure function of its inputs; running it twice on the same
/// reports yields the same insights in the same order.
#[derive(Debug, Default, Clone)]
pub struct InsightGenerator;

impl InsightGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produces the findings in a fixed order: region gap, root cause, opportunity,
    /// segment finding, then business health, top category and price sensitivity.
    ///
    /// `records` must be the same ledger the reports were computed from; it is
    /// re-scanned to break down the weakest region by category.
    pub fn generate(
        &self,
        records: &[TransactionRecord],
        metrics: &MetricsReport,
        segmentation: &SegmentationReport,
        elasticity: &ElasticityReport,
    ) -> InsightReport {
        let mut report = InsightReport::default();

        if metrics.record_count == 0 {
            report.insights.push(Insight::InsufficientData {
                reason: "the dataset contains no transactions".to_string(),
            });
            return report;
        }

        // 1-4. Regions
        self.regional_insights(records, metrics, &mut report);

        // 5. Segments
        report.insights.push(self.segment_insight(segmentation));

        // Supporting context
        report.insights.push(business_health(metrics));
        if let Some(category) = &metrics.top_category {
            if let Some(perf) = metrics.category_performance.get(category) {
                report.insights.push(Insight::TopCategory {
                    category: category.clone(),
                    total_profit: perf.total_profit,
                    margin_pct: perf.margin_pct,
                });
            }
        }
        for (category, result) in &elasticity.results {
            report.insights.push(Insight::PriceSensitivity {
                category: category.clone(),
                correlation: result.correlation,
                classification: result.classification,
            });
        }

        let kinds: Vec<&str> = report.insights.iter().map(Insight::kind).collect();
        tracing::info!(insights = report.insights.len(), ?kinds, "Insights generated.");
        report
    }

    /// Region gap (or no variance), root cause and opportunity estimate.
    fn regional_insights(
        &self,
        records: &[TransactionRecord],
        metrics: &MetricsReport,
        report: &mut InsightReport,
    ) {
        // 1. Rank
        let ranked = rank(metrics.regional_margins.iter().filter_map(|(name, m)| {
            m.margin_pct.map(|margin_pct| GroupSnapshot {
                name: name.clone(),
                total_sales: m.total_sales,
                total_profit: m.total_profit,
                margin_pct,
            })
        }));

        let (Some(weakest), Some(strongest)) = (ranked.first(), strongest_of(&ranked)) else {
            report.insights.push(Insight::InsufficientData {
                reason: "no region has sales to compute a margin from".to_string(),
            });
            return;
        };

        let gap = strongest.margin_pct - weakest.margin_pct;
        if ranked.len() == 1 {
            report.diagnostics.push(Diagnostic::SingleRegion { region: weakest.name.clone() });
        }
        if gap.is_zero() {
            report.insights.push(Insight::NoRegionalVariance {
                regions: ranked.iter().map(|r| r.name.clone()).collect(),
                margin_pct: weakest.margin_pct,
            });
        } else {
            report.insights.push(Insight::RegionGap {
                weakest: weakest.clone(),
                strongest: strongest.clone(),
                gap_pct_points: gap,
            });
        }

        // 2. Root cause inside the weakest region
        let categories = category_performance(records.iter().filter(|r| r.region() == weakest.name));
        let ranked_categories = rank(categories.into_iter().filter_map(|(name, perf)| {
            perf.margin_pct.map(|margin_pct| GroupSnapshot {
                name,
                total_sales: perf.total_sales,
                total_profit: perf.total_profit,
                margin_pct,
            })
        }));
        if let Some(category) = ranked_categories.into_iter().next() {
            report.insights.push(Insight::RootCause {
                region: weakest.name.clone(),
                category,
            });
        }

        // 3-4. Opportunity
        let potential_improvement = weakest.total_sales * gap / Decimal::ONE_HUNDRED;
        let total_profit: Decimal = metrics.regional_margins.values().map(|m| m.total_profit).sum();
        let uplift_pct = percentage(potential_improvement, total_profit);
        if uplift_pct.is_none() {
            report.diagnostics.push(Diagnostic::ArithmeticUndefined {
                metric: UndefinedMetric::ProfitUplift,
                subject: "all regions".to_string(),
            });
        }
        report.insights.push(Insight::OpportunityEstimate {
            region: weakest.name.clone(),
            benchmark_region: strongest.name.clone(),
            region_sales: weakest.total_sales,
            margin_gap_pct_points: gap,
            potential_improvement,
            total_profit,
            uplift_pct,
            assumes_constant_volume: true,
        });
    }

    fn segment_insight(&self, segmentation: &SegmentationReport) -> Insight {
        let present: Vec<Segment> = segmentation.segments.keys().copied().collect();
        let snapshot = |segment: Segment| {
            let stats = segmentation.segment(segment)?;
            Some(SegmentSnapshot {
                segment,
                customer_count: stats.customer_count,
                revenue: stats.revenue,
                revenue_share_pct: stats.revenue_share_pct,
                avg_revenue_per_customer: stats.avg_revenue_per_customer,
                margin_pct: stats.margin_pct?,
            })
        };

        match (snapshot(Segment::HighFrequency), snapshot(Segment::Standard)) {
            (Some(high_frequency), Some(standard)) => {
                let finding = if high_frequency.margin_pct < standard.margin_pct {
                    SegmentFinding::DiscountErosion
                } else {
                    SegmentFinding::PremiumPowerUser
                };
                Insight::SegmentMarginGap {
                    finding,
                    margin_gap_pct_points: high_frequency.margin_pct - standard.margin_pct,
                    high_frequency,
                    standard,
                }
            }
            _ => {
                let reason = if present.len() < 2 {
                    "customers do not split into two frequency segments".to_string()
                } else {
                    "a segment has no sales to compute a margin from".to_string()
                };
                Insight::SegmentInsufficientData { present, reason }
            }
        }
    }
}

fn business_health(metrics: &MetricsReport) -> Insight {
    Insight::BusinessHealth {
        mrr_growth_pct: metrics.mrr_growth_pct,
        total_sales: metrics.total_sales,
        total_profit: metrics.total_profit,
        margin_pct: percentage(metrics.total_profit, metrics.total_sales),
        customer_count: metrics.customer_count,
        synthetic_cac_latest: metrics.cac_trend.points.last().map(|p| p.value),
        synthetic_cac_improvement_pct: metrics.cac_trend.improvement_pct,
        cac_is_synthetic: metrics.cac_trend.is_synthetic,
    }
}

/// Orders groups weakest first: margin ascending, then total sales descending, then
/// name ascending so the order never depends on input order.
fn rank<I>(groups: I) -> Vec<GroupSnapshot>
where
    I: IntoIterator<Item = GroupSnapshot>,
{
    let mut ranked: Vec<GroupSnapshot> = groups.into_iter().collect();
    ranked.sort_by(compare_weakest_first);
    ranked
}

fn compare_weakest_first(a: &GroupSnapshot, b: &GroupSnapshot) -> Ordering {
    a.margin_pct
        .cmp(&b.margin_pct)
        .then_with(|| b.total_sales.cmp(&a.total_sales))
        .then_with(|| a.name.cmp(&b.name))
}

/// The maximum-margin group of a ranked list. Among equal margins the larger
/// seller wins, then the alphabetically first name.
fn strongest_of(ranked: &[GroupSnapshot]) -> Option<&GroupSnapshot> {
    let top_margin = ranked.last()?.margin_pct;
    ranked.iter().find(|g| g.margin_pct == top_margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::{ElasticityEstimator, MetricsEngine, SegmentationEngine};
    use chrono::NaiveDate;
    use configuration::{CacParams, ElasticityParams, SegmentationParams};
    use rust_decimal_macros::dec;

    fn sale(region: &str, category: &str, customer: &str, sales: Decimal, profit: Decimal) -> TransactionRecord {
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            region,
            category,
            customer,
            sales,
            profit,
            1,
        )
        .unwrap()
    }

    fn run(records: &[TransactionRecord]) -> InsightReport {
        let metrics = MetricsEngine::new(CacParams::default()).unwrap().calculate(records);
        let segmentation = SegmentationEngine::new(SegmentationParams::default())
            .unwrap()
            .calculate(records);
        let elasticity = ElasticityEstimator::new(ElasticityParams::default())
            .unwrap()
            .calculate(records);
        InsightGenerator::new().generate(records, &metrics, &segmentation, &elasticity)
    }

    fn kinds(report: &InsightReport) -> Vec<&'static str> {
        report.insights.iter().map(Insight::kind).collect()
    }

    fn two_region_ledger() -> Vec<TransactionRecord> {
        vec![
            // Region A: sales 1000, profit 100 -> 10%
            sale("A", "Furniture", "C-1", dec!(600), dec!(30)),
            sale("A", "Office", "C-2", dec!(400), dec!(70)),
            // Region B: sales 2000, profit 400 -> 20%
            sale("B", "Furniture", "C-3", dec!(2000), dec!(400)),
        ]
    }

    #[test]
    fn opportunity_closes_the_gap_to_the_strongest_region() {
        let report = run(&two_region_ledger());

        let Insight::OpportunityEstimate { region, benchmark_region, potential_improvement, total_profit, uplift_pct, .. } =
            &report.insights[2]
        else {
            panic!("expected an opportunity estimate, got {:?}", report.insights[2]);
        };
        assert_eq!(region, "A");
        assert_eq!(benchmark_region, "B");
        assert_eq!(*potential_improvement, dec!(100));
        assert_eq!(*total_profit, dec!(500));
        assert_eq!(*uplift_pct, Some(dec!(20)));
    }

    #[test]
    fn findings_follow_the_fixed_order() {
        let report = run(&two_region_ledger());
        assert_eq!(
            &kinds(&report)[..4],
            &["region_gap", "root_cause", "opportunity_estimate", "segment_insufficient_data"]
        );
        assert_eq!(kinds(&report)[4], "business_health");
    }

    #[test]
    fn root_cause_is_lowest_margin_category_of_weakest_region() {
        let report = run(&two_region_ledger());
        match &report.insights[1] {
            Insight::RootCause { region, category } => {
                assert_eq!(region, "A");
                assert_eq!(category.name, "Furniture");
                assert_eq!(category.margin_pct, dec!(5));
            }
            other => panic!("expected root cause, got {other:?}"),
        }
    }

    #[test]
    fn region_gap_carries_both_ends() {
        let report = run(&two_region_ledger());
        match &report.insights[0] {
            Insight::RegionGap { weakest, strongest, gap_pct_points } => {
                assert_eq!(weakest.name, "A");
                assert_eq!(weakest.margin_pct, dec!(10));
                assert_eq!(strongest.name, "B");
                assert_eq!(*gap_pct_points, dec!(10));
            }
            other => panic!("expected region gap, got {other:?}"),
        }
    }

    #[test]
    fn single_region_reports_no_variance_and_zero_opportunity() {
        let records = vec![
            sale("Only", "Furniture", "C-1", dec!(100), dec!(10)),
            sale("Only", "Office", "C-2", dec!(300), dec!(90)),
        ];
        let report = run(&records);

        assert_eq!(kinds(&report)[0], "no_regional_variance");
        match &report.insights[2] {
            Insight::OpportunityEstimate { potential_improvement, uplift_pct, region, benchmark_region, .. } => {
                assert_eq!(region, benchmark_region);
                assert!(potential_improvement.is_zero());
                assert_eq!(*uplift_pct, Some(dec!(0)));
            }
            other => panic!("expected opportunity, got {other:?}"),
        }
        assert!(report.diagnostics.contains(&Diagnostic::SingleRegion { region: "Only".to_string() }));
    }

    #[test]
    fn equal_margins_break_ties_by_sales_then_name() {
        let records = vec![
            sale("North", "Office", "C-1", dec!(100), dec!(10)),
            sale("South", "Office", "C-2", dec!(500), dec!(50)),
            sale("East", "Office", "C-3", dec!(500), dec!(50)),
            sale("West", "Office", "C-4", dec!(100), dec!(40)),
        ];
        let report = run(&records);
        match &report.insights[0] {
            Insight::RegionGap { weakest, strongest, .. } => {
                // 10% three ways: the larger sellers rank first, East before South.
                assert_eq!(weakest.name, "East");
                assert_eq!(strongest.name, "West");
            }
            other => panic!("expected region gap, got {other:?}"),
        }
    }

    #[test]
    fn zero_total_profit_leaves_uplift_undefined() {
        let records = vec![
            sale("A", "Office", "C-1", dec!(100), dec!(-50)),
            sale("B", "Office", "C-2", dec!(100), dec!(50)),
        ];
        let report = run(&records);
        match &report.insights[2] {
            Insight::OpportunityEstimate { potential_improvement, uplift_pct, .. } => {
                assert_eq!(*potential_improvement, dec!(100));
                assert_eq!(*uplift_pct, None);
            }
            other => panic!("expected opportunity, got {other:?}"),
        }
    }

    #[test]
    fn frequent_buyers_with_thinner_margin_signal_discount_erosion() {
        let mut records = Vec::new();
        for customer in ["C-1", "C-2", "C-3", "C-4"] {
            records.push(sale("A", "Office", customer, dec!(100), dec!(30)));
        }
        for _ in 0..5 {
            records.push(sale("A", "Office", "C-5", dec!(100), dec!(5)));
        }
        let report = run(&records);
        let segment = report
            .insights
            .iter()
            .find(|i| i.kind() == "segment_margin_gap")
            .unwrap();
        match segment {
            Insight::SegmentMarginGap { finding, high_frequency, standard, margin_gap_pct_points } => {
                assert_eq!(*finding, SegmentFinding::DiscountErosion);
                assert_eq!(high_frequency.customer_count, 1);
                assert_eq!(standard.customer_count, 4);
                assert_eq!(*margin_gap_pct_points, dec!(-25));
            }
            other => panic!("unexpected insight {other:?}"),
        }
    }

    #[test]
    fn frequent_buyers_with_richer_margin_are_premium() {
        let mut records = Vec::new();
        for customer in ["C-1", "C-2", "C-3", "C-4"] {
            records.push(sale("A", "Office", customer, dec!(100), dec!(5)));
        }
        for _ in 0..5 {
            records.push(sale("A", "Office", "C-5", dec!(100), dec!(30)));
        }
        let report = run(&records);
        assert!(report.insights.iter().any(|i| matches!(
            i,
            Insight::SegmentMarginGap { finding: SegmentFinding::PremiumPowerUser, .. }
        )));
    }

    #[test]
    fn empty_ledger_is_insufficient_data() {
        let report = run(&[]);
        assert_eq!(kinds(&report), vec!["insufficient_data"]);
    }

    #[test]
    fn business_health_labels_cac_as_synthetic() {
        let report = run(&two_region_ledger());
        let health = report.insights.iter().find(|i| i.kind() == "business_health").unwrap();
        match health {
            Insight::BusinessHealth { cac_is_synthetic, synthetic_cac_latest, total_sales, .. } => {
                assert!(*cac_is_synthetic);
                assert_eq!(*synthetic_cac_latest, Some(dec!(150)));
                assert_eq!(*total_sales, dec!(3000));
            }
            other => panic!("unexpected insight {other:?}"),
        }
    }
}
