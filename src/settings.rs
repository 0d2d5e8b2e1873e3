use std::fmt;
use std::str::FromStr;

use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{MiningError, Result};

// ------------- Algorithm -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Algorithm {
    #[default]
    Apriori,
    FpGrowth,
}
impl FromStr for Algorithm {
    type Err = MiningError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apriori" => Ok(Algorithm::Apriori),
            "fpgrowth" | "fp-growth" => Ok(Algorithm::FpGrowth),
            _ => Err(MiningError::UnknownAlgorithmVariant(s.to_owned())),
        }
    }
}
impl TryFrom<String> for Algorithm {
    type Error = MiningError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}
impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Algorithm::Apriori => write!(f, "apriori"),
            Algorithm::FpGrowth => write!(f, "fpgrowth"),
        }
    }
}

/// Rejects anything outside (0, 1], NaN included.
pub fn check_threshold(name: &'static str, value: f64) -> Result<f64> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(MiningError::InvalidThreshold { name, value })
    }
}

// ------------- MinerConfig -------------
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    pub algorithm: Algorithm,
    pub support_threshold: f64,    // fraction of transactions
    pub confidence_threshold: f64,
    pub max_length: Option<usize>, // None searches the whole lattice
}
impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Apriori,
            support_threshold: 0.2,
            confidence_threshold: 0.8,
            max_length: None,
        }
    }
}
impl MinerConfig {
    pub fn new(support_threshold: f64, confidence_threshold: f64) -> Self {
        Self {
            support_threshold,
            confidence_threshold,
            ..Self::default()
        }
    }
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }
    /// Reads an optional config file (format by extension), overlaid by `BASKET_*`
    /// environment variables such as `BASKET_SUPPORT_THRESHOLD`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with(path, None)
    }
    fn load_with(path: Option<&str>, env: Option<::config::Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("BASKET").try_parsing(true).source(env))
            .build()?;
        let config: MinerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        check_threshold("support_threshold", self.support_threshold)?;
        check_threshold("confidence_threshold", self.confidence_threshold)?;
        if self.max_length == Some(0) {
            return Err(MiningError::Config("max_length must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names() {
        assert_eq!("apriori".parse::<Algorithm>().unwrap(), Algorithm::Apriori);
        assert_eq!("FPGrowth".parse::<Algorithm>().unwrap(), Algorithm::FpGrowth);
        assert_eq!("fp-growth".parse::<Algorithm>().unwrap(), Algorithm::FpGrowth);
        assert_eq!(
            "eclat".parse::<Algorithm>(),
            Err(MiningError::UnknownAlgorithmVariant("eclat".into()))
        );
        assert_eq!(Algorithm::FpGrowth.to_string(), "fpgrowth");
    }

    #[test]
    fn thresholds_must_be_in_unit_interval() {
        assert!(check_threshold("t", 1.0).is_ok());
        assert!(check_threshold("t", 0.0001).is_ok());
        for bad in [0.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                check_threshold("t", bad),
                Err(MiningError::InvalidThreshold { name: "t", .. })
            ));
        }
    }

    #[test]
    fn defaults_without_sources() {
        let config = MinerConfig::load_with(None, Some(config::Map::new())).unwrap();
        assert_eq!(config, MinerConfig::default());
    }

    #[test]
    fn environment_overrides() {
        let mut env = config::Map::new();
        env.insert("BASKET_ALGORITHM".to_string(), "fpgrowth".to_string());
        env.insert("BASKET_SUPPORT_THRESHOLD".to_string(), "0.3".to_string());
        env.insert("BASKET_MAX_LENGTH".to_string(), "3".to_string());
        let config = MinerConfig::load_with(None, Some(env)).unwrap();
        assert_eq!(config.algorithm, Algorithm::FpGrowth);
        assert_eq!(config.support_threshold, 0.3);
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.max_length, Some(3));
    }

    #[test]
    fn file_source_is_validated() {
        let path = std::env::temp_dir().join("basket_config_test.toml");
        std::fs::write(&path, "algorithm = \"apriori\"\nconfidence_threshold = 1.5\n").unwrap();
        let err = MinerConfig::load_with(path.to_str(), Some(config::Map::new())).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, MiningError::InvalidThreshold { name: "confidence_threshold", .. }));
    }

    #[test]
    fn unknown_algorithm_in_source_is_rejected() {
        let mut env = config::Map::new();
        env.insert("BASKET_ALGORITHM".to_string(), "eclat".to_string());
        assert!(MinerConfig::load_with(None, Some(env)).is_err());
    }
}
