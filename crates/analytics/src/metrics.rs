use crate::diagnostics::{Diagnostic, UndefinedMetric};
use crate::error::AnalyticsError;
use crate::stats;
use configuration::CacParams;
use core_types::{percentage, TransactionRecord, YearMonth};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMetric {
    pub month: YearMonth,
    pub total_sales: Decimal,
    /// Percent change against the previous month in the series. `None` for the first
    /// month and after a month with zero revenue.
    pub growth_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalMargin {
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub total_sales: Decimal,
    pub total_profit: Decimal,
    pub total_quantity: u64,
    pub margin_pct: Option<Decimal>,
}

/// The placeholder CAC curve `initial_value * decay^i`.
///
/// Not derived from marketing spend. Anything built from it must say so.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticCac {
    pub initial_value: Decimal,
    pub decay: Decimal,
}

impl SyntheticCac {
    /// CAC at month index `i` (0 for the first month).
    pub fn value_at(&self, i: u32) -> Decimal {
        self.initial_value * self.decay.powu(u64::from(i))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacPoint {
    pub month: YearMonth,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacTrend {
    /// Always `true`: the trend is modelled, never measured.
    pub is_synthetic: bool,
    pub method: String,
    pub points: Vec<CacPoint>,
    /// `(first - last) / first * 100`, `None` without any points.
    pub improvement_pct: Option<Decimal>,
}

/// Time-series and cross-sectional business metrics for one ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub record_count: usize,
    pub customer_count: usize,
    pub total_sales: Decimal,
    pub total_profit: Decimal,

    // Time series (chronological)
    pub monthly: Vec<MonthlyMetric>,
    /// Mean of the defined month-over-month growth values.
    pub mrr_growth_pct: Option<Decimal>,
    pub cac_trend: CacTrend,

    // Cross-sections
    pub regional_margins: BTreeMap<String, RegionalMargin>,
    pub category_performance: BTreeMap<String, CategoryPerformance>,
    /// Category with the highest total profit.
    pub top_category: Option<String>,

    pub diagnostics: Vec<Diagnostic>,
}

/// A stateless calculator for the revenue, margin and synthetic CAC metrics.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    cac: SyntheticCac,
}

impl MetricsEngine {
    pub fn new(params: CacParams) -> Result<Self, AnalyticsError> {
        params.validate()?;
        Ok(Self {
            cac: SyntheticCac {
                initial_value: params.initial_value,
                decay: params.decay,
            },
        })
    }

    /// Computes every metric over the full record set.
    ///
    /// An empty input produces empty series and maps plus an `EmptyDataset`
    /// diagnostic; it is not an error.
    pub fn calculate(&self, records: &[TransactionRecord]) -> MetricsReport {
        let mut diagnostics = Vec::new();
        if records.is_empty() {
            diagnostics.push(Diagnostic::EmptyDataset);
        }

        let monthly = monthly_revenue(records, &mut diagnostics);
        let growth: Vec<Decimal> = monthly.iter().filter_map(|m| m.growth_pct).collect();
        let mrr_growth_pct = stats::mean(&growth);
        let cac_trend = self.cac_trend(&monthly);

        let regional = regional_margins(records);
        for (region, margin) in &regional {
            if margin.margin_pct.is_none() {
                diagnostics.push(Diagnostic::ArithmeticUndefined {
                    metric: UndefinedMetric::Margin,
                    subject: format!("region {region}"),
                });
            }
        }

        let categories = category_performance(records);
        let top_category = categories
            .iter()
            .max_by(|a, b| {
                a.1.total_profit
                    .cmp(&b.1.total_profit)
                    .then_with(|| b.0.cmp(a.0))
            })
            .map(|(name, _)| name.clone());

        let customer_count = records
            .iter()
            .map(TransactionRecord::customer_id)
            .collect::<BTreeSet<_>>()
            .len();

        let report = MetricsReport {
            record_count: records.len(),
            customer_count,
            total_sales: records.iter().map(TransactionRecord::sales_amount).sum(),
            total_profit: records.iter().map(TransactionRecord::profit).sum(),
            monthly,
            mrr_growth_pct,
            cac_trend,
            regional_margins: regional,
            category_performance: categories,
            top_category,
            diagnostics,
        };

        tracing::info!(
            months = report.monthly.len(),
            regions = report.regional_margins.len(),
            categories = report.category_performance.len(),
            mrr_growth_pct = ?report.mrr_growth_pct,
            "Business metrics calculated."
        );
        report
    }

    /// One synthetic CAC value per month, indexed by chronological position.
    fn cac_trend(&self, monthly: &[MonthlyMetric]) -> CacTrend {
        let points: Vec<CacPoint> = monthly
            .iter()
            .zip(0u32..)
            .map(|(m, i)| CacPoint {
                month: m.month,
                value: self.cac.value_at(i),
            })
            .collect();

        let improvement_pct = match (points.first(), points.last()) {
            (Some(first), Some(last)) => percentage(first.value - last.value, first.value),
            _ => None,
        };

        CacTrend {
            is_synthetic: true,
            method: format!(
                "synthetic: {} * {}^month_index (no marketing-spend data)",
                self.cac.initial_value, self.cac.decay
            ),
            points,
            improvement_pct,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct GroupTotals {
    sales: Decimal,
    profit: Decimal,
    quantity: u64,
}

impl GroupTotals {
    fn add(&mut self, record: &TransactionRecord) {
        self.sales += record.sales_amount();
        self.profit += record.profit();
        self.quantity += u64::from(record.quantity());
    }
}

/// Sums sales per calendar month and derives month-over-month growth.
///
/// The `BTreeMap` keyed by `YearMonth` establishes chronological order before any
/// growth value is computed.
pub fn monthly_revenue(
    records: &[TransactionRecord],
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<MonthlyMetric> {
    let mut by_month: BTreeMap<YearMonth, Decimal> = BTreeMap::new();
    for record in records {
        *by_month.entry(record.month()).or_default() += record.sales_amount();
    }

    let mut series = Vec::with_capacity(by_month.len());
    let mut previous: Option<Decimal> = None;
    for (month, total_sales) in by_month {
        let growth_pct = previous.and_then(|prev| {
            let growth = percentage(total_sales - prev, prev);
            if growth.is_none() {
                diagnostics.push(Diagnostic::ArithmeticUndefined {
                    metric: UndefinedMetric::GrowthRate,
                    subject: format!("month {month}"),
                });
            }
            growth
        });
        tracing::debug!(%month, %total_sales, ?growth_pct, "Monthly revenue.");
        series.push(MonthlyMetric { month, total_sales, growth_pct });
        previous = Some(total_sales);
    }
    series
}

/// Sales, profit and margin per region.
pub fn regional_margins(records: &[TransactionRecord]) -> BTreeMap<String, RegionalMargin> {
    group_by(records.iter(), TransactionRecord::region)
        .into_iter()
        .map(|(region, totals)| {
            let margin = RegionalMargin {
                total_sales: totals.sales,
                total_profit: totals.profit,
                margin_pct: percentage(totals.profit, totals.sales),
            };
            (region, margin)
        })
        .collect()
}

/// Sales, profit, units and margin per product category.
///
/// Accepts any iterator over records so callers can restrict it to a subset,
/// e.g. a single region.
pub fn category_performance<'a, I>(records: I) -> BTreeMap<String, CategoryPerformance>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    group_by(records, TransactionRecord::product_category)
        .into_iter()
        .map(|(category, totals)| {
            let performance = CategoryPerformance {
                total_sales: totals.sales,
                total_profit: totals.profit,
                total_quantity: totals.quantity,
                margin_pct: percentage(totals.profit, totals.sales),
            };
            (category, performance)
        })
        .collect()
}

fn group_by<'a, I, F>(records: I, key: F) -> BTreeMap<String, GroupTotals>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
    F: Fn(&TransactionRecord) -> &str,
{
    let mut groups: BTreeMap<String, GroupTotals> = BTreeMap::new();
    for record in records {
        match groups.get_mut(key(record)) {
            Some(totals) => totals.add(record),
            None => {
                let mut totals = GroupTotals::default();
                totals.add(record);
                groups.insert(key(record).to_string(), totals);
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(date: (i32, u32, u32), region: &str, category: &str, sales: Decimal, profit: Decimal) -> TransactionRecord {
        TransactionRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            region,
            category,
            "C-1",
            sales,
            profit,
            1,
        )
        .unwrap()
    }

    fn engine() -> MetricsEngine {
        MetricsEngine::new(CacParams::default()).unwrap()
    }

    fn ledger() -> Vec<TransactionRecord> {
        // Deliberately out of chronological order.
        vec![
            record((2024, 3, 2), "West", "Tech", dec!(150), dec!(30)),
            record((2024, 1, 9), "East", "Office", dec!(100), dec!(5)),
            record((2024, 2, 1), "West", "Office", dec!(200), dec!(40)),
            record((2024, 1, 20), "West", "Tech", dec!(100), dec!(25)),
        ]
    }

    #[test]
    fn monthly_series_is_chronological_with_growth() {
        let report = engine().calculate(&ledger());
        let months: Vec<String> = report.monthly.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);

        assert_eq!(report.monthly[0].growth_pct, None);
        assert_eq!(report.monthly[1].growth_pct, Some(dec!(0)));
        assert_eq!(report.monthly[2].growth_pct, Some(dec!(-25)));
        assert_eq!(report.mrr_growth_pct, Some(dec!(-12.5)));
    }

    #[test]
    fn monthly_totals_conserve_ledger_sales() {
        let records = ledger();
        let report = engine().calculate(&records);
        let monthly_sum: Decimal = report.monthly.iter().map(|m| m.total_sales).sum();
        let ledger_sum: Decimal = records.iter().map(|r| r.sales_amount()).sum();
        assert_eq!(monthly_sum, ledger_sum);
        assert_eq!(report.total_sales, ledger_sum);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let records = ledger();
        let first = engine().calculate(&records);
        let second = engine().calculate(&records);
        assert_eq!(first.monthly, second.monthly);
    }

    #[test]
    fn growth_after_zero_revenue_month_is_undefined_not_zero() {
        let records = vec![
            record((2024, 1, 1), "West", "Tech", dec!(0), dec!(0)),
            record((2024, 2, 1), "West", "Tech", dec!(50), dec!(5)),
            record((2024, 3, 1), "West", "Tech", dec!(100), dec!(10)),
        ];
        let report = engine().calculate(&records);
        assert_eq!(report.monthly[1].growth_pct, None);
        assert_eq!(report.monthly[2].growth_pct, Some(dec!(100)));
        // Only the defined value contributes to the mean.
        assert_eq!(report.mrr_growth_pct, Some(dec!(100)));
        assert!(report.diagnostics.contains(&Diagnostic::ArithmeticUndefined {
            metric: UndefinedMetric::GrowthRate,
            subject: "month 2024-02".to_string(),
        }));
    }

    #[test]
    fn synthetic_cac_is_a_pure_decay_curve() {
        let cac = SyntheticCac { initial_value: dec!(150), decay: dec!(0.98) };
        assert_eq!(cac.value_at(0), dec!(150));
        assert_eq!(cac.value_at(1), dec!(147));
        assert_eq!(cac.value_at(2), dec!(144.06));
    }

    #[test]
    fn cac_trend_is_labelled_and_strictly_decreasing() {
        let report = engine().calculate(&ledger());
        let trend = &report.cac_trend;
        assert!(trend.is_synthetic);
        assert!(trend.method.starts_with("synthetic"));
        assert_eq!(trend.points.len(), 3);
        assert!(trend.points.windows(2).all(|w| w[1].value < w[0].value));
        // (150 - 144.06) / 150 * 100
        assert_eq!(trend.improvement_pct, Some(dec!(3.96)));
    }

    #[test]
    fn regional_and_category_totals() {
        let report = engine().calculate(&ledger());

        let west = &report.regional_margins["West"];
        assert_eq!(west.total_sales, dec!(450));
        assert_eq!(west.total_profit, dec!(95));
        let east = &report.regional_margins["East"];
        assert_eq!(east.margin_pct, Some(dec!(5)));

        let office = &report.category_performance["Office"];
        assert_eq!(office.total_sales, dec!(300));
        assert_eq!(office.total_quantity, 2);
        assert_eq!(office.margin_pct, Some(dec!(15)));
        assert_eq!(report.top_category.as_deref(), Some("Tech"));
    }

    #[test]
    fn category_performance_accepts_a_filtered_subset() {
        let records = ledger();
        let west_only = category_performance(records.iter().filter(|r| r.region() == "West"));
        assert_eq!(west_only["Office"].total_sales, dec!(200));
        assert_eq!(west_only["Tech"].total_sales, dec!(250));
    }

    #[test]
    fn empty_ledger_yields_empty_metrics() {
        let report = engine().calculate(&[]);
        assert!(report.monthly.is_empty());
        assert!(report.cac_trend.points.is_empty());
        assert_eq!(report.cac_trend.improvement_pct, None);
        assert_eq!(report.mrr_growth_pct, None);
        assert!(report.regional_margins.is_empty());
        assert_eq!(report.top_category, None);
        assert_eq!(report.diagnostics, vec![Diagnostic::EmptyDataset]);
    }

    #[test]
    fn rejects_invalid_cac_parameters() {
        let params = CacParams { initial_value: dec!(150), decay: dec!(1.2) };
        assert!(MetricsEngine::new(params).is_err());
    }
}
