use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; a missing section falls back to
/// the documented business defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetParams,
    #[serde(default)]
    pub cac: CacParams,
    #[serde(default)]
    pub segmentation: SegmentationParams,
    #[serde(default)]
    pub elasticity: ElasticityParams,
}

impl Config {
    /// Checks that every section holds values the engines can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()?;
        self.cac.validate()?;
        self.segmentation.validate()?;
        self.elasticity.validate()?;
        Ok(())
    }
}

/// Parameters for reading and cleaning the transaction ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasetParams {
    /// `chrono` format strings tried in order when parsing the date column.
    pub date_formats: Vec<String>,
    pub imputation: ImputationParams,
}

impl DatasetParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.date_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "dataset.date_formats must list at least one format".to_string(),
            ));
        }
        self.imputation.validate()
    }
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%d-%m-%Y".to_string(),
            ],
            imputation: ImputationParams::default(),
        }
    }
}

/// Business-rule approximations applied to missing numeric values.
///
/// These are declared heuristics, not statistical estimates. Every value filled
/// with them is reported back to the caller.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImputationParams {
    /// A missing profit is filled as `sales_amount * profit_fallback_margin`.
    /// 0.30 corresponds to a flat 30% margin.
    pub profit_fallback_margin: Decimal,
    /// Fill a missing sales amount with the median of the record's product category.
    /// When disabled (or the category has no observed sales) the dataset-wide median is used.
    pub sales_by_category_median: bool,
}

impl ImputationParams {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.profit_fallback_margin < dec!(-1) || self.profit_fallback_margin > dec!(1) {
            return Err(ConfigError::ValidationError(
                "imputation.profit_fallback_margin must be between -1 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ImputationParams {
    fn default() -> Self {
        Self {
            profit_fallback_margin: dec!(0.30),
            sales_by_category_median: true,
        }
    }
}

/// Parameters of the synthetic customer-acquisition-cost trend.
///
/// There is no marketing-spend data behind this model; it is a placeholder curve
/// `initial_value * decay^i` and is always labelled as synthetic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacParams {
    /// CAC at the first month, in currency units.
    pub initial_value: Decimal,
    /// Multiplicative month-over-month factor. Must be in (0, 1).
    pub decay: Decimal,
}

impl CacParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_value <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "cac.initial_value must be greater than 0".to_string(),
            ));
        }
        if self.decay <= Decimal::ZERO || self.decay >= Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "cac.decay must be between 0 and 1 (exclusive)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacParams {
    fn default() -> Self {
        Self {
            initial_value: dec!(150),
            decay: dec!(0.98),
        }
    }
}

/// Parameters for the purchase-frequency segmentation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Percentile of the order-count distribution (0.0-1.0) at or above which a
    /// customer counts as high-frequency.
    pub high_frequency_percentile: f64,
}

impl SegmentationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.high_frequency_percentile) {
            return Err(ConfigError::ValidationError(
                "segmentation.high_frequency_percentile must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            high_frequency_percentile: 0.8,
        }
    }
}

/// Parameters for the price/volume correlation per category.
///
/// The classification cut-offs are a policy choice, not a statistical test.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ElasticityParams {
    /// A category needs strictly more date-points than this to be reported.
    pub min_date_points: usize,
    /// Correlations below this value classify a category as elastic.
    pub elastic_below: f64,
    /// Correlations above this value classify a category as price-insensitive.
    pub insensitive_above: f64,
}

impl ElasticityParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: f64| (-1.0..=1.0).contains(&v);
        if !in_range(self.elastic_below) || !in_range(self.insensitive_above) {
            return Err(ConfigError::ValidationError(
                "elasticity thresholds must lie within [-1, 1]".to_string(),
            ));
        }
        if self.elastic_below > self.insensitive_above {
            return Err(ConfigError::ValidationError(
                "elasticity.elastic_below must not exceed elasticity.insensitive_above".to_string(),
            ));
        }
        if self.min_date_points < 2 {
            return Err(ConfigError::ValidationError(
                "elasticity.min_date_points must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ElasticityParams {
    fn default() -> Self {
        Self {
            min_date_points: 10,
            elastic_below: -0.3,
            insensitive_above: 0.1,
        }
    }
}
