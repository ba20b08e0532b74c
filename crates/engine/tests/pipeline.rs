use analyzer::Insight;
use configuration::Config;
use core_types::ElasticityClass;
use engine::{EngineError, InsightPipeline};
use rust_decimal_macros::dec;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Writes a small ledger:
///
/// - West / Technology, C-1, twelve January days with rising price and falling
///   volume at a flat 25% margin.
/// - East / Furniture, February, four customers at 5%.
/// - East / Furniture, March, one row with a blank profit (imputed at 30%).
fn write_ledger(dir: &TempDir) -> PathBuf {
    let mut csv = String::from("Order Date,Region,Category,Customer ID,Sales,Profit,Quantity\n");
    for day in 1..=12u32 {
        let quantity = 30 - 2 * day;
        let sales = (10 + day) * quantity;
        let profit = f64::from(sales) / 4.0;
        writeln!(csv, "2024-01-{day:02},West,Technology,C-1,{sales},{profit:.2},{quantity}").unwrap();
    }
    for (day, customer) in [(1, "C-2"), (2, "C-3"), (3, "C-4"), (4, "C-4"), (5, "C-5"), (6, "C-5")] {
        writeln!(csv, "2024-02-{day:02},East,Furniture,{customer},100,5,1").unwrap();
    }
    csv.push_str("2024-03-01,East,Furniture,C-6,200,,3\n");

    let path = dir.path().join("ledger.csv");
    fs::write(&path, csv).unwrap();
    path
}

fn analyze() -> engine::AnalysisReport {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ledger(&dir);
    InsightPipeline::from_config(&Config::default())
        .unwrap()
        .analyze_file(&path)
        .unwrap()
}

#[test]
fn insights_come_out_in_the_fixed_order() {
    let report = analyze();
    let kinds: Vec<&str> = report.insights.iter().map(Insight::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "region_gap",
            "root_cause",
            "opportunity_estimate",
            "segment_margin_gap",
            "business_health",
            "top_category",
            "price_sensitivity",
        ]
    );
}

#[test]
fn weakest_region_and_opportunity() {
    let report = analyze();
    assert_eq!(report.record_count, 19);

    // East: 600 + 200 sales, 30 + 60 profit -> 11.25%. West: 25%.
    let east = &report.metrics.regional_margins["East"];
    assert_eq!(east.total_sales, dec!(800));
    assert_eq!(east.margin_pct, Some(dec!(11.25)));

    match &report.insights[2] {
        Insight::OpportunityEstimate { region, benchmark_region, margin_gap_pct_points, potential_improvement, .. } => {
            assert_eq!(region, "East");
            assert_eq!(benchmark_region, "West");
            assert_eq!(*margin_gap_pct_points, dec!(13.75));
            assert_eq!(*potential_improvement, dec!(110));
        }
        other => panic!("expected opportunity, got {other:?}"),
    }
}

#[test]
fn imputed_profit_is_reported_as_data_quality() {
    let report = analyze();
    assert_eq!(report.data_quality.len(), 1);
    assert_eq!(report.data_quality[0].rows_affected, 1);
    assert_eq!(report.data_quality[0].imputed_total, dec!(60));
    assert_eq!(report.data_quality[0].lines, vec![20]);
}

#[test]
fn only_the_dense_category_gets_an_elasticity() {
    let report = analyze();
    let technology = &report.elasticity.results["Technology"];
    assert_eq!(technology.date_points, 12);
    assert_eq!(technology.classification, ElasticityClass::Elastic);
    assert!(!report.elasticity.results.contains_key("Furniture"));
}

#[test]
fn synthetic_cac_declines_and_is_labelled() {
    let report = analyze();
    let trend = &report.metrics.cac_trend;
    assert!(trend.is_synthetic);
    assert_eq!(trend.points.len(), 3);
    assert!(trend.points.windows(2).all(|w| w[1].value < w[0].value));
}

#[test]
fn report_serializes_with_tagged_insights() {
    let report = analyze();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["insights"][0]["kind"], "region_gap");
    assert_eq!(json["metrics"]["cac_trend"]["is_synthetic"], true);
    assert_eq!(json["record_count"], 19);
}

#[test]
fn missing_column_aborts_before_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "Date,Region,Category,Sales,Profit,Quantity\n2024-01-01,West,Tech,1,1,1\n").unwrap();

    let err = InsightPipeline::from_config(&Config::default())
        .unwrap()
        .analyze_file(&path)
        .unwrap_err();
    assert!(matches!(err, EngineError::Dataset(dataset::DatasetError::MissingColumn { column: "customer_id", .. })));
}
