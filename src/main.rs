//! Runs the matrix multiplication variants and prints a comparison table.
//!
//! Usage: `mat4-bench [VARIANT...]`, configured through the `MAT4_*`
//! environment variables.

use std::process::ExitCode;

use mat4_autovec::{BenchConfig, ConfigError, TimeUnit, Variant, harness};
use tracing::error;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ConfigError> {
    let config = BenchConfig::from_env()?;
    let variants = std::env::args()
        .skip(1)
        .map(|name| name.parse())
        .collect::<Result<Vec<Variant>, _>>()?;
    let variants = if variants.is_empty() {
        Variant::ALL.to_vec()
    } else {
        variants
    };

    println!("=== 4x4 Matrix Multiplication Benchmark ===\n");
    println!(
        "warmup: {}, measurement: {}, forks: {}, ops/iteration: {}\n",
        config.warmup_iterations,
        config.measurement_iterations,
        config.forks(),
        harness::OPS_PER_ITERATION
    );

    let measurements = harness::run(&variants, &config);
    let unit = config.time_unit;

    println!(
        "{:<20} {:>5} {:>12} {:>12} {:>12} {:>9}",
        "Variant", "Fork", "Mean", "Min", "Max", "Speedup"
    );
    println!("{}", "-".repeat(75));

    for fork in 0..config.forks() {
        let baseline = measurements
            .iter()
            .find(|m| m.fork == fork && m.variant == Variant::BASELINE)
            .and_then(|m| m.mean());

        for measurement in measurements.iter().filter(|m| m.fork == fork) {
            let speedup = match (baseline, measurement.mean()) {
                (Some(baseline), Some(mean)) if mean > 0. => format!("{:.2}x", baseline / mean),
                _ => "-".to_owned(),
            };
            println!(
                "{:<20} {:>5} {:>12} {:>12} {:>12} {:>9}",
                measurement.variant.name(),
                fork,
                format_time(measurement.mean(), unit),
                format_time(measurement.min(), unit),
                format_time(measurement.max(), unit),
                speedup
            );
        }
    }

    println!(
        "\nTimes are per invocation. Speedup is relative to `{}`.",
        Variant::BASELINE
    );
    Ok(())
}

fn format_time(value: Option<f64>, unit: TimeUnit) -> String {
    match value {
        Some(value) => format!("{value:.3} {unit}"),
        None => "-".to_owned(),
    }
}
