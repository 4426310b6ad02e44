use std::fmt::Debug;
use std::hash::Hash;

use fxhash::FxHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::LearnerError;
use crate::learner::{Learner, LearnerInfo};
use crate::mdp::Mdp;
use crate::table::{FxIndexMap, StateActionTable};

/// Steps simulated when evaluating a candidate policy.
const ROLLOUT_LENGTH: usize = 100;
/// Sweep budget for the re-plan triggered by each feedback event.
const PLANNING_ITERATIONS: usize = 100;

/// Tracks canonical policy signatures across improvement sweeps. A signature
/// seen before is recorded as cycling; the second detection of a cycling
/// signature means the sweep is orbiting and iteration should stop.
struct CycleDetector<A> {
    seen: Vec<Vec<A>>,
    cycling: Vec<Vec<A>>,
}

impl<A: PartialEq + Clone> CycleDetector<A> {
    fn new() -> Self {
        Self {
            seen: vec![],
            cycling: vec![],
        }
    }

    /// Returns true when `signature` was already recorded as cycling.
    fn observe(&mut self, signature: Vec<A>) -> bool {
        if self.seen.contains(&signature) {
            if self.cycling.contains(&signature) {
                return true;
            }
            self.cycling.push(signature);
        } else {
            self.seen.push(signature);
        }
        false
    }

    fn sample_cycle_member(&self, rng: &mut StdRng) -> Vec<A> {
        self.cycling[rng.gen_range(0..self.cycling.len())].clone()
    }
}

/// Model-based learner: smooths a reward-function estimate from feedback,
/// keeps a transition model captured once at construction (the environment is
/// assumed deterministic), and re-plans in full after every feedback event by
/// iterative policy improvement over fixed-length simulated rollouts.
pub struct ModelBasedLearner<S, A> {
    discount_factor: f64,
    learning_rate: f64,
    random_choose: f64,
    states: Vec<S>,
    reward_function: StateActionTable<S, A>,
    transition_function: FxIndexMap<S, FxIndexMap<A, S>>,
    optimal_policy: FxIndexMap<S, A>,
    value_function: FxIndexMap<S, f64>,
    rng: StdRng,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> ModelBasedLearner<S, A> {
    pub fn new(
        mdp: &dyn Mdp<S, A>,
        discount_factor: f64,
        learning_rate: f64,
        random_choose: f64,
        init_reward: f64,
        seed: u64,
    ) -> Result<Self, LearnerError> {
        let reward_function = StateActionTable::from_mdp(mdp, init_reward)?;
        let states = mdp.states();
        let state_set: FxHashSet<S> = states.iter().cloned().collect();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut transition_function: FxIndexMap<S, FxIndexMap<A, S>> = FxIndexMap::default();
        let mut optimal_policy: FxIndexMap<S, A> = FxIndexMap::default();
        let mut value_function: FxIndexMap<S, f64> = FxIndexMap::default();
        for state in &states {
            let actions = mdp.available_actions(state);
            let mut row: FxIndexMap<A, S> = FxIndexMap::default();
            for action in &actions {
                let next = mdp.next_state(state, action);
                if !state_set.contains(&next) {
                    return Err(LearnerError::UnreachableState {
                        state: format!("{:?}", state),
                        action: format!("{:?}", action),
                    });
                }
                row.insert(action.clone(), next);
            }
            // arbitrary starting policy, refined by the first re-plan
            let start = actions[rng.gen_range(0..actions.len())].clone();
            optimal_policy.insert(state.clone(), start);
            value_function.insert(state.clone(), 0.0);
            transition_function.insert(state.clone(), row);
        }

        Ok(Self {
            discount_factor,
            learning_rate,
            random_choose,
            states,
            reward_function,
            transition_function,
            optimal_policy,
            value_function,
            rng,
        })
    }

    pub fn optimal_policy(&self) -> &FxIndexMap<S, A> {
        &self.optimal_policy
    }

    pub fn value_function(&self) -> &FxIndexMap<S, f64> {
        &self.value_function
    }

    pub fn reward_function(&self) -> &StateActionTable<S, A> {
        &self.reward_function
    }

    /// Exponential smoothing of the reward estimate for one pair.
    pub fn update_reward_function(
        &mut self,
        state: &S,
        action: &A,
        reward: f64,
    ) -> Result<(), LearnerError> {
        let current = self.reward_function.get(state, action)?;
        self.reward_function
            .add(state, action, self.learning_rate * (reward - current))
    }

    /// Discounted return of a fixed-length rollout from `start` following
    /// `policy` through the captured transition model.
    fn simulated_return(&self, start: &S, policy: &FxIndexMap<S, A>) -> f64 {
        let mut total = 0.0;
        let mut discount = 1.0;
        let mut state = start.clone();
        for _ in 0..ROLLOUT_LENGTH {
            let action = policy[&state].clone();
            total += self.reward_function.get(&state, &action).unwrap() * discount;
            discount *= self.discount_factor;
            state = self.transition_function[&state][&action].clone();
        }
        total
    }

    fn signature(&self) -> Vec<A> {
        self.states
            .iter()
            .map(|state| self.optimal_policy[state].clone())
            .collect()
    }

    fn apply_signature(&mut self, signature: Vec<A>) {
        for (state, action) in self.states.iter().zip(signature) {
            self.optimal_policy.insert(state.clone(), action);
        }
    }

    /// Iterative policy improvement.
    ///
    /// Each sweep re-evaluates every state by simulating each candidate
    /// action spliced into the current policy. Iteration stops at a fixed
    /// point (no action changed over a sweep), when the budget runs out, or
    /// when the cycle detector fires: a policy signature seen before is
    /// recorded as cycling, and the second detection of a cycling signature
    /// terminates with a uniform choice among the cycle members. Running out
    /// of budget is a defined termination path, not an error.
    pub fn calc_optimal_policy(&mut self, max_iterations: usize) {
        let mut detector = CycleDetector::new();
        for _ in 0..max_iterations {
            let mut policy_changed = false;
            for index in 0..self.states.len() {
                let state = self.states[index].clone();
                let actions: Vec<A> = self.transition_function[&state].keys().cloned().collect();
                let mut candidate = self.optimal_policy.clone();
                let mut best_action = self.optimal_policy[&state].clone();
                let mut best_value = f64::NEG_INFINITY;
                for action in actions {
                    candidate.insert(state.clone(), action.clone());
                    let value = self.simulated_return(&state, &candidate);
                    // strictly-greater comparison keeps the first maximizer in
                    // the provider's action order, so ties resolve consistently
                    if value > best_value {
                        best_value = value;
                        best_action = action;
                    }
                }
                if self.optimal_policy[&state] != best_action {
                    self.optimal_policy.insert(state.clone(), best_action);
                    policy_changed = true;
                }
            }
            if !policy_changed {
                break;
            }
            if detector.observe(self.signature()) {
                debug!("policy iteration cycle detected twice, sampling a cycle member");
                let pick = detector.sample_cycle_member(&mut self.rng);
                self.apply_signature(pick);
                break;
            }
        }

        let values: Vec<f64> = self
            .states
            .iter()
            .map(|state| self.simulated_return(state, &self.optimal_policy))
            .collect();
        for (state, value) in self.states.iter().zip(values) {
            self.value_function.insert(state.clone(), value);
        }
    }
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> Learner<S, A>
    for ModelBasedLearner<S, A>
{
    fn request_action(&mut self, state: &S) -> Result<A, LearnerError> {
        let optimal = self
            .optimal_policy
            .get(state)
            .cloned()
            .ok_or_else(|| LearnerError::UnknownState(format!("{:?}", state)))?;
        if self.rng.gen::<f64>() < self.random_choose {
            let non_optimal: Vec<&A> = self.transition_function[state]
                .keys()
                .filter(|a| **a != optimal)
                .collect();
            if !non_optimal.is_empty() {
                debug!("random move");
                return Ok(non_optimal[self.rng.gen_range(0..non_optimal.len())].clone());
            }
        }
        debug!("optimal move");
        Ok(optimal)
    }

    fn process_feedback(
        &mut self,
        state: &S,
        action: &A,
        response: f64,
    ) -> Result<(), LearnerError> {
        self.update_reward_function(state, action, response)?;
        self.calc_optimal_policy(PLANNING_ITERATIONS);
        Ok(())
    }

    fn get_info(&mut self) -> LearnerInfo<S, A> {
        LearnerInfo::RewardFunction(self.reward_function.snapshot())
    }
}
