//! Console rendering of an `AnalysisReport`: one table per metric family, then a
//! sentence per insight.

use analytics::{ElasticityReport, MetricsReport, SegmentationReport};
use analyzer::{Insight, SegmentFinding};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use core_types::ElasticityClass;
use engine::AnalysisReport;
use rust_decimal::Decimal;
use std::fmt::{self, Write as _};

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn pct(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{:.2}%", v),
        None => "n/a".to_string(),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Renders the whole report as console text.
pub fn render_report(report: &AnalysisReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Sales insights report {} ({} records, generated {})\n",
        report.report_id,
        report.record_count,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    if !report.data_quality.is_empty() {
        writeln!(out, "Data quality:")?;
        for warning in &report.data_quality {
            writeln!(out, "  - {warning}")?;
        }
        out.push('\n');
    }

    if report.record_count > 0 {
        writeln!(out, "{}\n", monthly_table(&report.metrics))?;
        writeln!(out, "{}\n", regional_table(&report.metrics))?;
        writeln!(out, "{}\n", category_table(&report.metrics))?;
        writeln!(out, "{}\n", segment_table(&report.segmentation))?;
        if !report.elasticity.results.is_empty() {
            writeln!(out, "{}\n", elasticity_table(&report.elasticity))?;
        }
    }

    writeln!(out, "Insights:")?;
    for (idx, insight) in report.insights.iter().enumerate() {
        writeln!(out, "  {}. {}", idx + 1, narrate(insight))?;
    }

    if !report.diagnostics.is_empty() {
        writeln!(out, "\nDiagnostics:")?;
        for diagnostic in &report.diagnostics {
            writeln!(out, "  - {diagnostic}")?;
        }
    }
    Ok(out)
}

fn monthly_table(metrics: &MetricsReport) -> Table {
    let mut table = new_table(vec!["Month", "Sales", "Growth", "Synthetic CAC"]);
    for (month, cac) in metrics.monthly.iter().zip(&metrics.cac_trend.points) {
        table.add_row(vec![
            Cell::new(month.month),
            Cell::new(money(month.total_sales)),
            Cell::new(pct(month.growth_pct)),
            Cell::new(money(cac.value)),
        ]);
    }
    table
}

fn regional_table(metrics: &MetricsReport) -> Table {
    let mut table = new_table(vec!["Region", "Sales", "Profit", "Margin"]);
    for (region, m) in &metrics.regional_margins {
        table.add_row(vec![
            Cell::new(region),
            Cell::new(money(m.total_sales)),
            Cell::new(money(m.total_profit)),
            Cell::new(pct(m.margin_pct)),
        ]);
    }
    table
}

fn category_table(metrics: &MetricsReport) -> Table {
    let mut table = new_table(vec!["Category", "Sales", "Profit", "Units", "Margin"]);
    for (category, c) in &metrics.category_performance {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(money(c.total_sales)),
            Cell::new(money(c.total_profit)),
            Cell::new(c.total_quantity),
            Cell::new(pct(c.margin_pct)),
        ]);
    }
    table
}

fn segment_table(segmentation: &SegmentationReport) -> Table {
    let mut table = new_table(vec![
        "Segment",
        "Customers",
        "Revenue",
        "Revenue share",
        "Avg revenue / customer",
        "Avg orders / customer",
        "Margin",
    ]);
    for (segment, s) in &segmentation.segments {
        table.add_row(vec![
            Cell::new(segment),
            Cell::new(s.customer_count),
            Cell::new(money(s.revenue)),
            Cell::new(pct(s.revenue_share_pct)),
            Cell::new(money(s.avg_revenue_per_customer)),
            Cell::new(format!("{:.2}", s.avg_orders_per_customer)),
            Cell::new(pct(s.margin_pct)),
        ]);
    }
    table
}

fn elasticity_table(elasticity: &ElasticityReport) -> Table {
    let mut table = new_table(vec!["Category", "Correlation", "Sensitivity", "Days", "Mean price"]);
    for (category, r) in &elasticity.results {
        table.add_row(vec![
            Cell::new(category),
            Cell::new(format!("{:.3}", r.correlation)),
            Cell::new(r.classification),
            Cell::new(r.date_points),
            Cell::new(format!("{:.2}", r.mean_price)),
        ]);
    }
    table
}

/// One plain-language sentence for an insight.
pub fn narrate(insight: &Insight) -> String {
    match insight {
        Insight::InsufficientData { reason } => format!("Not enough data for insights: {reason}."),
        Insight::RegionGap { weakest, strongest, gap_pct_points } => format!(
            "{} has the lowest margin at {:.2}%, {:.2} points below {} ({:.2}%).",
            weakest.name, weakest.margin_pct, gap_pct_points, strongest.name, strongest.margin_pct
        ),
        Insight::NoRegionalVariance { regions, margin_pct } => format!(
            "No regional margin variance: {} all earn {:.2}%.",
            regions.join(", "),
            margin_pct
        ),
        Insight::RootCause { region, category } => format!(
            "Within {}, {} has the thinnest margin ({:.2}% on {} sales).",
            region,
            category.name,
            category.margin_pct,
            money(category.total_sales)
        ),
        Insight::OpportunityEstimate {
            region,
            benchmark_region,
            potential_improvement,
            uplift_pct,
            ..
        } => {
            let uplift = match uplift_pct {
                Some(v) => format!(", a {:.2}% lift on total profit", v),
                None => String::new(),
            };
            format!(
                "Matching {}'s margin in {} would add about {} profit at current volume{}.",
                benchmark_region,
                region,
                money(*potential_improvement),
                uplift
            )
        }
        Insight::SegmentMarginGap { finding, high_frequency, standard, .. } => {
            let headline = match finding {
                SegmentFinding::DiscountErosion => {
                    "Discount erosion: frequent buyers earn a thinner margin"
                }
                SegmentFinding::PremiumPowerUser => {
                    "Premium power users: frequent buyers earn at least the standard margin"
                }
            };
            format!(
                "{} ({:.2}% across {} customers vs {:.2}% across {}).",
                headline,
                high_frequency.margin_pct,
                high_frequency.customer_count,
                standard.margin_pct,
                standard.customer_count
            )
        }
        Insight::SegmentInsufficientData { reason, .. } => {
            format!("No segment comparison: {reason}.")
        }
        Insight::BusinessHealth {
            mrr_growth_pct,
            total_sales,
            margin_pct,
            customer_count,
            synthetic_cac_latest,
            synthetic_cac_improvement_pct,
            ..
        } => {
            let cac = match synthetic_cac_latest {
                Some(latest) => format!(
                    "; synthetic CAC (modelled, not measured) ends at {} after a {} decline",
                    money(*latest),
                    pct(*synthetic_cac_improvement_pct)
                ),
                None => String::new(),
            };
            format!(
                "Business health: {} sales from {} customers at {} margin, average monthly growth {}{}.",
                money(*total_sales),
                customer_count,
                pct(*margin_pct),
                pct(*mrr_growth_pct),
                cac
            )
        }
        Insight::TopCategory { category, total_profit, margin_pct } => format!(
            "{} is the most profitable category ({} profit, {} margin).",
            category,
            money(*total_profit),
            pct(*margin_pct)
        ),
        Insight::PriceSensitivity { category, correlation, classification } => format!(
            "{} is {} to price (correlation {:.2}).",
            category,
            match classification {
                ElasticityClass::Elastic => "sensitive",
                ElasticityClass::Insensitive => "insensitive",
                ElasticityClass::Moderate => "moderately sensitive",
            },
            correlation
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyzer::GroupSnapshot;
    use configuration::Config;
    use engine::InsightPipeline;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_report_renders_only_the_insufficient_data_line() {
        let pipeline = InsightPipeline::from_config(&Config::default()).unwrap();
        let report = pipeline.run(&Default::default());
        let text = render_report(&report).unwrap();

        assert!(text.contains("(0 records"));
        assert!(text.contains("1. Not enough data for insights: the dataset contains no transactions."));
        assert!(!text.contains("Region"));
    }

    #[test]
    fn opportunity_sentence_mentions_amount_and_lift() {
        let insight = Insight::OpportunityEstimate {
            region: "East".to_string(),
            benchmark_region: "West".to_string(),
            region_sales: dec!(1000),
            margin_gap_pct_points: dec!(10),
            potential_improvement: dec!(100),
            total_profit: dec!(500),
            uplift_pct: Some(dec!(20)),
            assumes_constant_volume: true,
        };
        assert_eq!(
            narrate(&insight),
            "Matching West's margin in East would add about 100.00 profit at current volume, a 20.00% lift on total profit."
        );
    }

    #[test]
    fn undefined_uplift_is_left_out() {
        let insight = Insight::OpportunityEstimate {
            region: "East".to_string(),
            benchmark_region: "West".to_string(),
            region_sales: dec!(100),
            margin_gap_pct_points: dec!(100),
            potential_improvement: dec!(100),
            total_profit: dec!(0),
            uplift_pct: None,
            assumes_constant_volume: true,
        };
        assert!(!narrate(&insight).contains("lift"));
    }

    #[test]
    fn health_sentence_flags_cac_as_modelled() {
        let insight = Insight::BusinessHealth {
            mrr_growth_pct: None,
            total_sales: dec!(3000),
            total_profit: dec!(500),
            margin_pct: Some(dec!(16.67)),
            customer_count: 3,
            synthetic_cac_latest: Some(dec!(147)),
            synthetic_cac_improvement_pct: Some(dec!(2)),
            cac_is_synthetic: true,
        };
        let text = narrate(&insight);
        assert!(text.contains("synthetic CAC (modelled, not measured)"));
        assert!(text.contains("growth n/a"));
    }

    #[test]
    fn region_gap_sentence() {
        let group = |name: &str, margin| GroupSnapshot {
            name: name.to_string(),
            total_sales: dec!(1000),
            total_profit: dec!(100),
            margin_pct: margin,
        };
        let insight = Insight::RegionGap {
            weakest: group("A", dec!(10)),
            strongest: group("B", dec!(20)),
            gap_pct_points: dec!(10),
        };
        assert_eq!(
            narrate(&insight),
            "A has the lowest margin at 10.00%, 10.00 points below B (20.00%)."
        );
    }
}
