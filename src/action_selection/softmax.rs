use rand::rngs::StdRng;
use rand::Rng;

use crate::utils::categorical_sample;

use super::ActionSelection;

/// Temperatures below this are clamped so the division never blows up.
const MIN_TEMPERATURE: f64 = 1e-8;

/// Boltzmann selection: probabilities proportional to `exp(value / temperature)`,
/// sampled by inverse CDF on a single uniform draw.
#[derive(Debug, Clone)]
pub struct Softmax {
    pub temperature: f64,
}

impl Softmax {
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl ActionSelection for Softmax {
    fn select(&mut self, rng: &mut StdRng, values: &[f64]) -> usize {
        let temperature = self.temperature.max(MIN_TEMPERATURE);
        let max_value = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        // shifting by the max keeps the normalizer >= 1, so the per-element
        // division below cannot produce NaN
        let exp_values: Vec<f64> = values
            .iter()
            .map(|v| ((v - max_value) / temperature).exp())
            .collect();
        let norm: f64 = exp_values.iter().sum();
        let probs: Vec<f64> = exp_values.iter().map(|e| e / norm).collect();
        categorical_sample(&probs, rng.gen::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn near_zero_temperature_degenerates_to_greedy_without_nan() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut selection = Softmax::new(0.0);
        for _ in 0..50 {
            assert_eq!(selection.select(&mut rng, &[0.0, 5.0, 1.0]), 1);
        }
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut selection = Softmax::new(0.5);
        let index = selection.select(&mut rng, &[1e6, -1e6, 0.0]);
        assert_eq!(index, 0);
    }

    #[test]
    fn high_temperature_spreads_the_draws() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut selection = Softmax::new(100.0);
        let mut seen = [false, false];
        for _ in 0..200 {
            seen[selection.select(&mut rng, &[0.0, 1.0])] = true;
        }
        assert!(seen[0] && seen[1]);
    }
}
