use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiningError {
    #[error("Invalid threshold: {name} = {value} is outside (0, 1]")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("Invalid transaction at index {index}: {reason}")]
    InvalidTransaction { index: usize, reason: String },
    #[error("Unknown algorithm variant: {0}")]
    UnknownAlgorithmVariant(String),
    #[error("Division by zero computing {what}")]
    DivisionByZero { what: &'static str },
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Mining cancelled")]
    Cancelled,
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, MiningError>;

// Helper conversions
impl From<config::ConfigError> for MiningError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for MiningError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e.to_string()) }
}
impl From<std::io::Error> for MiningError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
