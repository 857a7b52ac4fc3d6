//! Benchmark configuration, read from the `MAT4_*` environment variables.

use std::{fmt, str::FromStr, time::Duration};

use tracing::debug;

use crate::error::{ConfigError, Result};

pub const WARMUP_ITERATIONS_VAR: &str = "MAT4_WARMUP_ITERATIONS";
pub const MEASUREMENT_ITERATIONS_VAR: &str = "MAT4_MEASUREMENT_ITERATIONS";
pub const FORKS_VAR: &str = "MAT4_FORKS";
pub const TIME_UNIT_VAR: &str = "MAT4_TIME_UNIT";
pub const SEED_VAR: &str = "MAT4_SEED";

/// Unit in which per-invocation times are reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
        }
    }

    /// Average time of one of `ops` operations that together took `elapsed`.
    pub fn per_op(self, elapsed: Duration, ops: u64) -> f64 {
        let nanos = elapsed.as_nanos() as f64 / ops.max(1) as f64;
        match self {
            TimeUnit::Nanoseconds => nanos,
            TimeUnit::Microseconds => nanos / 1e3,
            TimeUnit::Milliseconds => nanos / 1e6,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" => Ok(TimeUnit::Nanoseconds),
            "us" | "µs" => Ok(TimeUnit::Microseconds),
            "ms" => Ok(TimeUnit::Milliseconds),
            _ => Err(ConfigError::InvalidTimeUnit(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub warmup_iterations: u32,
    pub measurement_iterations: u32,
    /// Number of independent runs. Zero runs once, like a single unforked run.
    pub fork_count: u32,
    pub time_unit: TimeUnit,
    /// Fixed RNG seed for reproducible inputs.
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 5,
            measurement_iterations: 10,
            fork_count: 1,
            time_unit: TimeUnit::Nanoseconds,
            seed: None,
        }
    }
}

impl BenchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from `lookup`, keeping defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(WARMUP_ITERATIONS_VAR) {
            config.warmup_iterations = parse_number(WARMUP_ITERATIONS_VAR, &value)?;
        }
        if let Some(value) = lookup(MEASUREMENT_ITERATIONS_VAR) {
            config.measurement_iterations = parse_number(MEASUREMENT_ITERATIONS_VAR, &value)?;
        }
        if let Some(value) = lookup(FORKS_VAR) {
            config.fork_count = parse_number(FORKS_VAR, &value)?;
        }
        if let Some(value) = lookup(TIME_UNIT_VAR) {
            config.time_unit = value.parse()?;
        }
        if let Some(value) = lookup(SEED_VAR) {
            config.seed = Some(parse_number(SEED_VAR, &value)?);
        }

        config.validate()?;
        debug!(?config, "resolved benchmark config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.measurement_iterations == 0 {
            return Err(ConfigError::ZeroMeasurementIterations);
        }
        Ok(())
    }

    pub fn forks(&self) -> u32 {
        self.fork_count.max(1)
    }
}

fn parse_number<T: FromStr>(var: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            var: var.to_owned(),
            value: value.to_owned(),
        })
}
