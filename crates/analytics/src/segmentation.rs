use crate::diagnostics::{Diagnostic, UndefinedMetric};
use crate::error::AnalyticsError;
use crate::stats;
use configuration::SegmentationParams;
use core_types::{percentage, Segment, TransactionRecord};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub total_revenue: Decimal,
    /// Number of ledger rows for this customer.
    pub order_count: usize,
    pub total_profit: Decimal,
    pub total_quantity: u64,
    pub avg_order_value: Decimal,
    pub profit_margin: Option<Decimal>,
    pub segment: Segment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentStats {
    pub customer_count: usize,
    pub revenue: Decimal,
    pub profit: Decimal,
    pub orders: usize,
    pub quantity: u64,
    pub avg_revenue_per_customer: Decimal,
    pub avg_orders_per_customer: Decimal,
    /// Share of the revenue summed over all present segments.
    pub revenue_share_pct: Option<Decimal>,
    pub margin_pct: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentationReport {
    /// The order-count percentile every customer was compared against.
    pub threshold: Option<f64>,
    /// Customer profiles ordered by customer id.
    pub customers: Vec<CustomerProfile>,
    /// Only segments with at least one member are present.
    pub segments: BTreeMap<Segment, SegmentStats>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SegmentationReport {
    pub fn segment(&self, segment: Segment) -> Option<&SegmentStats> {
        self.segments.get(&segment)
    }
}

/// Splits customers into purchase-frequency cohorts.
#[derive(Debug, Clone)]
pub struct SegmentationEngine {
    params: SegmentationParams,
}

#[derive(Debug, Default)]
struct CustomerTotals {
    revenue: Decimal,
    profit: Decimal,
    orders: usize,
    quantity: u64,
}

impl SegmentationEngine {
    pub fn new(params: SegmentationParams) -> Result<Self, AnalyticsError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Aggregates per customer, then classifies everyone against one threshold.
    ///
    /// The percentile is computed once from the complete customer population before
    /// any customer is assigned, so membership depends only on a customer's own
    /// order count and that threshold.
    pub fn calculate(&self, records: &[TransactionRecord]) -> SegmentationReport {
        let mut totals: BTreeMap<&str, CustomerTotals> = BTreeMap::new();
        for record in records {
            let entry = totals.entry(record.customer_id()).or_default();
            entry.revenue += record.sales_amount();
            entry.profit += record.profit();
            entry.orders += 1;
            entry.quantity += u64::from(record.quantity());
        }

        let order_counts: Vec<f64> = totals.values().map(|t| t.orders as f64).collect();
        let threshold = stats::percentile_linear(&order_counts, self.params.high_frequency_percentile);

        let customers: Vec<CustomerProfile> = totals
            .into_iter()
            .map(|(customer_id, t)| {
                let segment = match threshold {
                    Some(limit) if t.orders as f64 >= limit => Segment::HighFrequency,
                    _ => Segment::Standard,
                };
                CustomerProfile {
                    customer_id: customer_id.to_string(),
                    total_revenue: t.revenue,
                    order_count: t.orders,
                    total_profit: t.profit,
                    total_quantity: t.quantity,
                    // Every aggregated customer has at least one order.
                    avg_order_value: t.revenue / Decimal::from(t.orders),
                    profit_margin: percentage(t.profit, t.revenue),
                    segment,
                }
            })
            .collect();

        let (segments, diagnostics) = roll_up(&customers);

        tracing::info!(
            customers = customers.len(),
            threshold = ?threshold,
            high_frequency = segments.get(&Segment::HighFrequency).map_or(0, |s| s.customer_count),
            standard = segments.get(&Segment::Standard).map_or(0, |s| s.customer_count),
            "Customers segmented."
        );

        SegmentationReport { threshold, customers, segments, diagnostics }
    }
}

/// Builds per-segment statistics from classified customers.
fn roll_up(customers: &[CustomerProfile]) -> (BTreeMap<Segment, SegmentStats>, Vec<Diagnostic>) {
    #[derive(Default)]
    struct Acc {
        customers: usize,
        revenue: Decimal,
        profit: Decimal,
        orders: usize,
        quantity: u64,
    }

    let mut accs: BTreeMap<Segment, Acc> = BTreeMap::new();
    for customer in customers {
        let acc = accs.entry(customer.segment).or_default();
        acc.customers += 1;
        acc.revenue += customer.total_revenue;
        acc.profit += customer.total_profit;
        acc.orders += customer.order_count;
        acc.quantity += customer.total_quantity;
    }

    let mut diagnostics = Vec::new();
    let combined_revenue: Decimal = accs.values().map(|a| a.revenue).sum();
    if !accs.is_empty() && combined_revenue.is_zero() {
        diagnostics.push(Diagnostic::ArithmeticUndefined {
            metric: UndefinedMetric::RevenueShare,
            subject: "all segments".to_string(),
        });
    }
    if accs.len() == 1 {
        if let Some(segment) = accs.keys().next() {
            diagnostics.push(Diagnostic::SingleSegment { segment: *segment });
        }
    }

    let stats = accs
        .into_iter()
        .map(|(segment, acc)| {
            let members = Decimal::from(acc.customers);
            let stats = SegmentStats {
                customer_count: acc.customers,
                revenue: acc.revenue,
                profit: acc.profit,
                orders: acc.orders,
                quantity: acc.quantity,
                avg_revenue_per_customer: acc.revenue / members,
                avg_orders_per_customer: Decimal::from(acc.orders) / members,
                revenue_share_pct: percentage(acc.revenue, combined_revenue),
                margin_pct: percentage(acc.profit, acc.revenue),
            };
            (segment, stats)
        })
        .collect();

    (stats, diagnostics)
}
