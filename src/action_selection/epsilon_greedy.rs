use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::utils::max_indices;

use super::ActionSelection;

/// Greedy selection with probability `1 - random_choose`, otherwise a uniform
/// draw from the non-maximizing actions. Ties among maximizers are broken
/// uniformly at random; when every action is maximal the exploratory branch
/// falls back to a maximizer.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    pub random_choose: f64,
}

impl EpsilonGreedy {
    pub fn new(random_choose: f64) -> Self {
        Self { random_choose }
    }
}

impl ActionSelection for EpsilonGreedy {
    fn select(&mut self, rng: &mut StdRng, values: &[f64]) -> usize {
        let maximizers = max_indices(values);
        if rng.gen::<f64>() < self.random_choose {
            let non_max: Vec<usize> = (0..values.len())
                .filter(|i| !maximizers.contains(i))
                .collect();
            if !non_max.is_empty() {
                debug!("random move");
                return non_max[rng.gen_range(0..non_max.len())];
            }
        }
        debug!("optimal move");
        maximizers[rng.gen_range(0..maximizers.len())]
    }
}
