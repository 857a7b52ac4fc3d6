//! In-process benchmark driver.
//!
//! Each iteration refreshes the trial context and then times
//! [`OPS_PER_ITERATION`] back-to-back kernel invocations. Warmup iterations
//! run the same way but are not recorded.

use std::{hint::black_box, time::Instant};

use approx::relative_eq;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    config::{BenchConfig, TimeUnit},
    multiply::Variant,
    trial::TrialContext,
};

/// Kernel invocations timed per iteration.
pub const OPS_PER_ITERATION: u64 = 1_000_000;

/// Largest per-cell difference from the loop reference that still counts as correct.
pub const TOLERANCE: f32 = 1e-5;

/// Timings of one variant in one fork.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub variant: Variant,
    pub fork: u32,
    /// Average time per invocation for each measurement iteration.
    pub iterations: Vec<f64>,
    pub unit: TimeUnit,
}

// The statistics are `None` when no iteration was recorded.
impl Measurement {
    pub fn mean(&self) -> Option<f64> {
        if self.iterations.is_empty() {
            return None;
        }
        Some(self.iterations.iter().sum::<f64>() / self.iterations.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.iterations.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.iterations.iter().copied().reduce(f64::max)
    }
}

pub fn rng_for(config: &BenchConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Checks the product currently held in `context.c` against the loop reference.
pub fn verify(context: &TrialContext) -> bool {
    let expected = &context.a * &context.b;
    relative_eq!(
        expected,
        context.c,
        epsilon = TOLERANCE,
        max_relative = TOLERANCE
    )
}

pub fn measure(
    variant: Variant,
    fork: u32,
    config: &BenchConfig,
    rng: &mut StdRng,
) -> Measurement {
    measure_with_ops(variant, fork, config, rng, OPS_PER_ITERATION)
}

fn measure_with_ops(
    variant: Variant,
    fork: u32,
    config: &BenchConfig,
    rng: &mut StdRng,
    ops: u64,
) -> Measurement {
    let mut context = TrialContext::new(rng);

    for iteration in 0..config.warmup_iterations {
        let per_op = run_iteration(variant, &mut context, rng, ops, config.time_unit);
        debug!(%variant, fork, iteration, per_op, "warmup");
    }

    let mut iterations = Vec::with_capacity(config.measurement_iterations as usize);
    for iteration in 0..config.measurement_iterations {
        let per_op = run_iteration(variant, &mut context, rng, ops, config.time_unit);
        debug!(%variant, fork, iteration, per_op, "measurement");
        iterations.push(per_op);
    }

    if !verify(&context) {
        warn!(%variant, "result differs from the loop reference");
    }

    let measurement = Measurement {
        variant,
        fork,
        iterations,
        unit: config.time_unit,
    };
    info!(
        %variant,
        fork,
        mean = ?measurement.mean(),
        unit = %measurement.unit,
        "measured"
    );
    measurement
}

fn run_iteration(
    variant: Variant,
    context: &mut TrialContext,
    rng: &mut StdRng,
    ops: u64,
    unit: TimeUnit,
) -> f64 {
    context.refresh(rng);
    let function = variant.function();

    let start = Instant::now();
    for _ in 0..ops {
        function(
            black_box(context.a.flat_cells()),
            black_box(context.b.flat_cells()),
            black_box(context.c.flat_cells_mut()),
        );
    }
    let elapsed = start.elapsed();

    unit.per_op(elapsed, ops)
}

/// Measures every variant in every fork, sharing one RNG.
pub fn run(variants: &[Variant], config: &BenchConfig) -> Vec<Measurement> {
    run_with_ops(variants, config, OPS_PER_ITERATION)
}

fn run_with_ops(variants: &[Variant], config: &BenchConfig, ops: u64) -> Vec<Measurement> {
    let mut rng = rng_for(config);
    let mut measurements = Vec::with_capacity(variants.len() * config.forks() as usize);
    for fork in 0..config.forks() {
        for &variant in variants {
            measurements.push(measure_with_ops(variant, fork, config, &mut rng, ops));
        }
    }
    measurements
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::matrix::Matrix4x4;

    fn quick_config() -> BenchConfig {
        BenchConfig {
            warmup_iterations: 1,
            measurement_iterations: 3,
            fork_count: 0,
            time_unit: TimeUnit::Nanoseconds,
            seed: Some(5),
        }
    }

    #[test]
    fn test_measure_records_measurement_iterations() {
        let config = quick_config();
        let mut rng = rng_for(&config);

        for &variant in Variant::ALL {
            let measurement = measure_with_ops(variant, 0, &config, &mut rng, 100);

            assert_eq!(measurement.variant, variant);
            assert_eq!(measurement.iterations.len(), 3);
            assert!(measurement.iterations.iter().all(|t| *t >= 0.));

            let (min, mean, max) = (
                measurement.min().unwrap(),
                measurement.mean().unwrap(),
                measurement.max().unwrap(),
            );
            assert!(min <= mean);
            assert!(mean <= max);
        }
    }

    #[test]
    fn test_measurement_statistics() {
        let measurement = Measurement {
            variant: Variant::Loop,
            fork: 0,
            iterations: vec![1., 2., 6.],
            unit: TimeUnit::Nanoseconds,
        };

        assert_eq!(measurement.mean(), Some(3.));
        assert_eq!(measurement.min(), Some(1.));
        assert_eq!(measurement.max(), Some(6.));
    }

    #[test]
    fn test_empty_measurement_has_no_statistics() {
        let measurement = Measurement {
            variant: Variant::Loop,
            fork: 0,
            iterations: Vec::new(),
            unit: TimeUnit::Nanoseconds,
        };

        assert_eq!(measurement.mean(), None);
        assert_eq!(measurement.min(), None);
        assert_eq!(measurement.max(), None);
    }

    #[test]
    fn test_verify_accepts_every_variant() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut context = TrialContext::new(&mut rng);

        for &variant in Variant::ALL {
            context.c = Matrix4x4::ZERO;
            context.run(variant);
            assert!(verify(&context), "{variant}");
        }
    }

    #[test]
    fn test_verify_rejects_corrupted_output() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut context = TrialContext::new(&mut rng);

        assert!(!verify(&context), "zeroed output must not pass");

        context.c = Matrix4x4::from_flat([f32::NAN; 16]);
        assert!(!verify(&context));

        context.run(Variant::Loop);
        context.c[(2, 1)] += 0.5;
        assert!(!verify(&context));
    }

    #[test]
    fn test_run_repeats_variants_per_fork() {
        let config = BenchConfig {
            fork_count: 2,
            ..quick_config()
        };
        let variants = [Variant::Loop, Variant::UnrolledFma];

        let measurements = run_with_ops(&variants, &config, 10);

        assert_eq!(measurements.len(), 4);
        let forks: Vec<(u32, Variant)> = measurements
            .iter()
            .map(|measurement| (measurement.fork, measurement.variant))
            .collect();
        assert_eq!(
            forks,
            [
                (0, Variant::Loop),
                (0, Variant::UnrolledFma),
                (1, Variant::Loop),
                (1, Variant::UnrolledFma),
            ]
        );
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = quick_config();
        let first = TrialContext::new(&mut rng_for(&config));
        let second = TrialContext::new(&mut rng_for(&config));

        assert_eq!(first.a, second.a);
    }
}
