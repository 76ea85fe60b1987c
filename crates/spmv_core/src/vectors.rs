//! Deterministic dense-vector generators for benchmark inputs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::Scalar;

/// How to fill a dense input vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorPattern {
    /// Every element set to the given value.
    Constant(Scalar),
    /// Seeded uniform values in `[lo, hi]`, reproducible across runs.
    Uniform { seed: u64, lo: Scalar, hi: Scalar },
}

impl VectorPattern {
    pub fn generate(&self, len: usize) -> Vec<Scalar> {
        match *self {
            Self::Constant(value) => vec![value; len],
            Self::Uniform { seed, lo, hi } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..len).map(|_| rng.gen_range(lo..=hi)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_fills_every_element() {
        assert_eq!(VectorPattern::Constant(1.0).generate(4), vec![1.0; 4]);
        assert_eq!(VectorPattern::Constant(0.0).generate(0), Vec::<Scalar>::new());
    }

    #[test]
    fn uniform_is_deterministic_per_seed() {
        let pattern = VectorPattern::Uniform {
            seed: 0xA11CE,
            lo: -2.0,
            hi: 2.0,
        };
        let first = pattern.generate(16);
        let again = pattern.generate(16);
        assert_eq!(first, again);
        assert!(first.iter().all(|v| (-2.0..=2.0).contains(v)));

        let other = VectorPattern::Uniform {
            seed: 42,
            lo: -2.0,
            hi: 2.0,
        }
        .generate(16);
        assert_ne!(first, other);
    }
}
