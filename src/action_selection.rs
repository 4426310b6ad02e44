mod epsilon_greedy;
mod softmax;
mod uniform_random;

use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;

pub use epsilon_greedy::EpsilonGreedy;
pub use softmax::Softmax;
pub use uniform_random::UniformRandom;

/// Picks an index into a slice of per-action value estimates, drawing all
/// randomness from the caller's injected source.
#[enum_dispatch]
pub trait ActionSelection {
    fn select(&mut self, rng: &mut StdRng, values: &[f64]) -> usize;
}

#[derive(Debug, Clone)]
#[enum_dispatch(ActionSelection)]
pub enum EnumActionSelection {
    EpsilonGreedy(EpsilonGreedy),
    Softmax(Softmax),
    UniformRandom(UniformRandom),
}
