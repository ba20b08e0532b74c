use crate::diagnostics::{Diagnostic, UndefinedMetric};
use crate::error::AnalyticsError;
use crate::stats;
use chrono::NaiveDate;
use configuration::ElasticityParams;
use core_types::{percentage, ElasticityClass, TransactionRecord};
use rust_decimal::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElasticityResult {
    /// Pearson correlation between daily average unit price and daily units sold.
    pub correlation: f64,
    pub classification: ElasticityClass,
    /// Number of days that contributed a price/volume pair.
    pub date_points: usize,
    pub mean_price: f64,
    /// Margin over the days that contributed a point.
    pub margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElasticityReport {
    /// Only categories with enough date-points and a defined correlation.
    pub results: BTreeMap<String, ElasticityResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Totals for one category on one day.
#[derive(Debug, Default, Clone, Copy)]
struct DailyTotals {
    sales: Decimal,
    quantity: u64,
    profit: Decimal,
}

impl DailyTotals {
    /// Average unit price, undefined on a day without units sold.
    fn avg_price(&self) -> Option<Decimal> {
        if self.quantity == 0 {
            return None;
        }
        self.sales.checked_div(Decimal::from(self.quantity))
    }
}

/// Price/volume pairs and money totals of one category, in date order.
#[derive(Debug, Default)]
struct CategorySeries {
    prices: Vec<f64>,
    quantities: Vec<f64>,
    sales: Decimal,
    profit: Decimal,
}

/// Estimates price sensitivity per product category from daily price/volume pairs.
///
/// The classification cut-offs are policy, not a significance test.
#[derive(Debug, Clone)]
pub struct ElasticityEstimator {
    params: ElasticityParams,
}

impl ElasticityEstimator {
    pub fn new(params: ElasticityParams) -> Result<Self, AnalyticsError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn classify(&self, correlation: f64) -> ElasticityClass {
        if correlation < self.params.elastic_below {
            ElasticityClass::Elastic
        } else if correlation > self.params.insensitive_above {
            ElasticityClass::Insensitive
        } else {
            ElasticityClass::Moderate
        }
    }

    pub fn calculate(&self, records: &[TransactionRecord]) -> ElasticityReport {
        let mut daily: BTreeMap<(&str, NaiveDate), DailyTotals> = BTreeMap::new();
        for record in records {
            let totals = daily.entry((record.product_category(), record.date())).or_default();
            totals.sales += record.sales_amount();
            totals.quantity += u64::from(record.quantity());
            totals.profit += record.profit();
        }

        let mut series: BTreeMap<&str, CategorySeries> = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for ((category, date), totals) in &daily {
            let points = series.entry(*category).or_default();
            match totals.avg_price().and_then(|p| p.to_f64()) {
                Some(price) => {
                    points.prices.push(price);
                    points.quantities.push(totals.quantity as f64);
                    points.sales += totals.sales;
                    points.profit += totals.profit;
                }
                None => diagnostics.push(Diagnostic::ArithmeticUndefined {
                    metric: UndefinedMetric::AveragePrice,
                    subject: format!("{category} on {date}"),
                }),
            }
        }

        let mut results = BTreeMap::new();
        for (category, points) in series {
            let date_points = points.prices.len();
            if date_points <= self.params.min_date_points {
                tracing::debug!(category, date_points, "Too few date-points for elasticity.");
                diagnostics.push(Diagnostic::SparseCategory {
                    category: category.to_string(),
                    date_points,
                    required_more_than: self.params.min_date_points,
                });
                continue;
            }

            let Some(correlation) = stats::pearson(&points.prices, &points.quantities) else {
                diagnostics.push(Diagnostic::ArithmeticUndefined {
                    metric: UndefinedMetric::Correlation,
                    subject: category.to_string(),
                });
                continue;
            };

            let result = ElasticityResult {
                correlation,
                classification: self.classify(correlation),
                date_points,
                mean_price: points.prices.iter().sum::<f64>() / date_points as f64,
                margin_pct: percentage(points.profit, points.sales),
            };
            tracing::debug!(category, correlation, classification = %result.classification, "Elasticity estimated.");
            results.insert(category.to_string(), result);
        }

        tracing::info!(
            categories = results.len(),
            skipped = diagnostics.len(),
            "Price elasticity estimated."
        );
        ElasticityReport { results, diagnostics }
    }
}
