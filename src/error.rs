use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: expected a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
    #[error("unknown time unit {0:?}, expected one of ns, us, ms")]
    InvalidTimeUnit(String),
    #[error("measurement iterations must be at least 1")]
    ZeroMeasurementIterations,
    #[error("unknown variant {0:?}")]
    UnknownVariant(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
