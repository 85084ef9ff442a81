//! Random victim source for RR.
//!
//! The original implementation this spec distills from seeds a 64-bit
//! Mersenne Twister (`std::mt19937_64`) once from `std::random_device` and
//! draws a uniform index from it on every full-cache insert. No crate in
//! the grounding codebase's own dependency graph provides a Mersenne
//! Twister; `rand` (already a dependency one level away, in the
//! grounding codebase's sibling benchmarking crate) provides `StdRng`, a
//! CSPRNG with the properties this crate actually relies on — seeded once
//! from OS entropy, 64-bit-capable, uniform — so it's used here in place
//! of a niche Mersenne Twister crate. See DESIGN.md.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Thin wrapper so RR's engine doesn't depend on `rand`'s API surface
/// directly; only this module needs to change if the RNG backend ever
/// does.
pub(crate) struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Seeds from a nondeterministic OS source. Requires the `std` feature
    /// (OS entropy access needs an environment to ask).
    #[cfg(feature = "std")]
    pub(crate) fn from_entropy() -> Self {
        RandomSource {
            rng: StdRng::from_rng(rand::thread_rng()).expect("OS entropy source unavailable"),
        }
    }

    /// Seeds deterministically from a caller-supplied value. Available
    /// without `std`, and useful for reproducible tests.
    pub(crate) fn from_seed(seed: u64) -> Self {
        RandomSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a uniform index in `[0, bound)`. `bound` must be nonzero.
    pub(crate) fn gen_below(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_below_stays_in_range() {
        let mut source = RandomSource::from_seed(42);
        for _ in 0..1000 {
            let v = source.gen_below(7);
            assert!(v < 7);
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = RandomSource::from_seed(1);
        let mut b = RandomSource::from_seed(1);
        for _ in 0..10 {
            assert_eq!(a.gen_below(1000), b.gen_below(1000));
        }
    }

    #[cfg(feature = "std")]
    #[test]
    fn from_entropy_constructs() {
        let mut source = RandomSource::from_entropy();
        let _ = source.gen_below(10);
    }
}
