use rand::rngs::StdRng;
use rand::Rng;

use super::ActionSelection;

/// Uniform draw over the available actions, ignoring values.
#[derive(Debug, Clone, Default)]
pub struct UniformRandom;

impl UniformRandom {
    pub fn new() -> Self {
        Self
    }
}

impl ActionSelection for UniformRandom {
    fn select(&mut self, rng: &mut StdRng, values: &[f64]) -> usize {
        rng.gen_range(0..values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn every_index_is_reachable() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut selection = UniformRandom::new();
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[selection.select(&mut rng, &[9.0, 0.0, -1.0])] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
