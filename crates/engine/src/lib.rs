//! # Sales Insights Engine
//!
//! The orchestrator that ties the workspace together. It owns one instance of each
//! calculator, built from a validated `Config`, and turns a `CleanedDataset` into an
//! `AnalysisReport`.
//!
//! Metrics, segmentation and elasticity only read the shared record slice, so they
//! run concurrently on the rayon pool. The insight generator needs all three
//! results and runs afterwards.

use analytics::{ElasticityEstimator, MetricsEngine, SegmentationEngine};
use analyzer::InsightGenerator;
use chrono::Utc;
use configuration::{Config, DatasetParams};
use dataset::CleanedDataset;
use std::path::Path;
use uuid::Uuid;

pub mod error;
pub mod report;

pub use error::EngineError;
pub use report::AnalysisReport;

/// A ready-to-run analysis pipeline.
#[derive(Debug, Clone)]
pub struct InsightPipeline {
    dataset: DatasetParams,
    metrics: MetricsEngine,
    segmentation: SegmentationEngine,
    elasticity: ElasticityEstimator,
    generator: InsightGenerator,
}

impl InsightPipeline {
    /// Builds every stage from the configuration. Fails on out-of-range parameters
    /// before any data is touched.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            dataset: config.dataset.clone(),
            metrics: MetricsEngine::new(config.cac.clone())?,
            segmentation: SegmentationEngine::new(config.segmentation.clone())?,
            elasticity: ElasticityEstimator::new(config.elasticity.clone())?,
            generator: InsightGenerator::new(),
        })
    }

    /// Loads and cleans a CSV ledger with the configured dataset rules.
    pub fn load(&self, path: &Path) -> Result<CleanedDataset, EngineError> {
        let dataset = dataset::load_csv(path, &self.dataset)?;
        Ok(dataset)
    }

    /// Loads a ledger and runs the full analysis over it.
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport, EngineError> {
        let dataset = self.load(path)?;
        Ok(self.run(&dataset))
    }

    /// Runs every stage over an already cleaned dataset.
    ///
    /// Infallible: degenerate input shows up as diagnostics and insufficient-data
    /// insights, never as an error.
    pub fn run(&self, dataset: &CleanedDataset) -> AnalysisReport {
        let records = dataset.records.as_slice();
        tracing::info!(records = records.len(), warnings = dataset.warnings.len(), "Starting analysis run.");

        let (metrics, (segmentation, elasticity)) = rayon::join(
            || self.metrics.calculate(records),
            || {
                rayon::join(
                    || self.segmentation.calculate(records),
                    || self.elasticity.calculate(records),
                )
            },
        );

        let insights = self
            .generator
            .generate(records, &metrics, &segmentation, &elasticity);

        let diagnostics: Vec<_> = metrics
            .diagnostics
            .iter()
            .chain(&segmentation.diagnostics)
            .chain(&elasticity.diagnostics)
            .chain(&insights.diagnostics)
            .cloned()
            .collect();
        for diagnostic in &diagnostics {
            tracing::warn!(%diagnostic, "Analysis diagnostic.");
        }

        let report = AnalysisReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            record_count: records.len(),
            data_quality: dataset.warnings.clone(),
            diagnostics,
            metrics,
            segmentation,
            elasticity,
            insights: insights.insights,
        };
        tracing::info!(
            report_id = %report.report_id,
            insights = report.insights.len(),
            diagnostics = report.diagnostics.len(),
            "Analysis run complete."
        );
        report
    }
}
