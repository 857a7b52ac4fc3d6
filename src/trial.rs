use rand::Rng;

use crate::{matrix::Matrix4x4, multiply::Variant};

/// Inputs and output of one benchmark run.
///
/// A context belongs to a single run and is never shared between threads.
#[derive(Debug, Clone)]
pub struct TrialContext {
    pub a: Matrix4x4,
    pub b: Matrix4x4,
    pub c: Matrix4x4,
}

impl TrialContext {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut context = Self {
            a: Matrix4x4::ZERO,
            b: Matrix4x4::ZERO,
            c: Matrix4x4::ZERO,
        };
        context.refresh(rng);
        context
    }

    /// Draws new uniform `[0, 1)` inputs and resets the output to the zero template.
    pub fn refresh(&mut self, rng: &mut impl Rng) {
        self.c = Matrix4x4::ZERO;
        for (a, b) in self
            .a
            .flat_cells_mut()
            .iter_mut()
            .zip(self.b.flat_cells_mut().iter_mut())
        {
            *a = rng.gen_range(0.0..1.0);
            *b = rng.gen_range(0.0..1.0);
        }
    }

    #[inline]
    pub fn run(&mut self, variant: Variant) {
        variant.apply(
            self.a.flat_cells(),
            self.b.flat_cells(),
            self.c.flat_cells_mut(),
        );
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_refresh_resets_output_and_draws_unit_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut context = TrialContext::new(&mut rng);
        context.run(Variant::Loop);
        assert_ne!(context.c, Matrix4x4::ZERO);

        let previous_a = context.a;
        context.refresh(&mut rng);

        assert_eq!(context.c, Matrix4x4::ZERO);
        assert_ne!(context.a, previous_a);
        for &cell in context.a.flat_cells().iter().chain(context.b.flat_cells()) {
            assert!((0.0..1.0).contains(&cell), "{cell} outside [0, 1)");
        }
    }

    #[test]
    fn test_seeded_contexts_match() {
        let first = TrialContext::new(&mut StdRng::seed_from_u64(42));
        let second = TrialContext::new(&mut StdRng::seed_from_u64(42));

        assert_eq!(first.a, second.a);
        assert_eq!(first.b, second.b);
    }

    #[test]
    fn test_run_leaves_inputs_untouched() {
        let mut context = TrialContext::new(&mut StdRng::seed_from_u64(3));
        let (a, b) = (context.a, context.b);

        for &variant in Variant::ALL {
            context.run(variant);
            assert_eq!(context.a, a);
            assert_eq!(context.b, b);
            assert_relative_eq!(context.c, &a * &b, epsilon = 1e-5, max_relative = 1e-5);
        }
    }
}
