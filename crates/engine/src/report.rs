use analytics::{Diagnostic, ElasticityReport, MetricsReport, SegmentationReport};
use analyzer::Insight;
use chrono::{DateTime, Utc};
use dataset::DataQualityWarning;
use serde::Serialize;
use uuid::Uuid;

/// Everything one analysis run produced, ready to render or export.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    /// Imputation rules that fired while loading.
    pub data_quality: Vec<DataQualityWarning>,
    /// Diagnostics of every stage, in stage order: metrics, segmentation,
    /// elasticity, insights.
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: MetricsReport,
    pub segmentation: SegmentationReport,
    pub elasticity: ElasticityReport,
    pub insights: Vec<Insight>,
}

impl AnalysisReport {
    /// True when no rule had to fill in a value and no stage raised a diagnostic.
    pub fn is_clean(&self) -> bool {
        self.data_quality.is_empty() && self.diagnostics.is_empty()
    }
}
