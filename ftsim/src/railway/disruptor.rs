//! Probabilistic fault injection.
//!
//! One disruptor is owned by each `GlobalMap`. All failure decisions of a
//! run draw from its single seeded stream, so the same sequence of calls
//! gives the same outcomes for a given seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct Disruptor {
    rng: ChaCha8Rng,
}

impl Disruptor {
    pub fn new(seed: u64) -> Disruptor {
        Disruptor { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// True with probability `ratio_percent / 100`.
    pub fn should_disrupt(&mut self, ratio_percent: u32) -> bool {
        self.rng.gen_range(0..100u32) < ratio_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_ratios() {
        let mut d = Disruptor::new(7);
        assert!((0..1000).all(|_| !d.should_disrupt(0)));
        assert!((0..1000).all(|_| d.should_disrupt(100)));
    }

    #[test]
    fn same_seed_same_outcomes() {
        let mut a = Disruptor::new(42);
        let mut b = Disruptor::new(42);
        let xs: Vec<bool> = (0..200).map(|_| a.should_disrupt(30)).collect();
        let ys: Vec<bool> = (0..200).map(|_| b.should_disrupt(30)).collect();
        assert_eq!(xs, ys);
        let hits = xs.iter().filter(|x| **x).count();
        assert!(hits > 20 && hits < 110);
    }
}
