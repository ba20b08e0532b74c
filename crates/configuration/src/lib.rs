use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    CacParams, Config, DatasetParams, ElasticityParams, ImputationParams, SegmentationParams,
};

/// The file looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `SALES_INSIGHTS__CAC__DECAY=0.95`.
pub const ENV_PREFIX: &str = "SALES_INSIGHTS";

/// Loads the application configuration.
///
/// An explicit `path` must exist. Without one, `config.toml` in the working
/// directory is read if present. Environment variables override file values, and
/// anything left unset falls back to the built-in defaults. The result is validated
/// before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(?config, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn defaults_match_business_constants() {
        let config = Config::default();
        assert_eq!(config.cac.initial_value, dec!(150));
        assert_eq!(config.cac.decay, dec!(0.98));
        assert_eq!(config.dataset.imputation.profit_fallback_margin, dec!(0.30));
        assert_eq!(config.segmentation.high_frequency_percentile, 0.8);
        assert_eq!(config.elasticity.min_date_points, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let file = write_toml(
            r#"
[cac]
initial_value = 200
decay = 0.9

[elasticity]
elastic_below = -0.5
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.cac.initial_value, dec!(200));
        assert_eq!(config.cac.decay, dec!(0.9));
        assert_eq!(config.elasticity.elastic_below, -0.5);
        assert_eq!(config.elasticity.insensitive_above, 0.1);
        assert_eq!(config.segmentation.high_frequency_percentile, 0.8);
    }

    #[test]
    fn rejects_non_decaying_cac() {
        let file = write_toml("[cac]\ndecay = 1.0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_out_of_range_percentile() {
        let mut config = Config::default();
        config.segmentation.high_frequency_percentile = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
