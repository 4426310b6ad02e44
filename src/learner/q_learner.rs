use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::action_selection::{ActionSelection, EnumActionSelection};
use crate::error::LearnerError;
use crate::learner::{Learner, LearnerInfo};
use crate::mdp::Mdp;
use crate::table::StateActionTable;

/// Tabular one-step Q-learning.
///
/// Also serves as the shared base for [`super::TraceQLearner`], which reuses
/// the table, the selection strategy and the temporal-difference computation.
pub struct QLearner<S, A> {
    mdp: Rc<dyn Mdp<S, A>>,
    discount_factor: f64,
    learning_rate: f64,
    q_values: StateActionTable<S, A>,
    action_selection: EnumActionSelection,
    rng: StdRng,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> QLearner<S, A> {
    pub fn new(
        mdp: Rc<dyn Mdp<S, A>>,
        discount_factor: f64,
        learning_rate: f64,
        init_q: f64,
        action_selection: EnumActionSelection,
        seed: u64,
    ) -> Result<Self, LearnerError> {
        let q_values = StateActionTable::from_mdp(mdp.as_ref(), init_q)?;
        Ok(Self {
            mdp,
            discount_factor,
            learning_rate,
            q_values,
            action_selection,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn q_values(&self) -> &StateActionTable<S, A> {
        &self.q_values
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub(crate) fn q_values_mut(&mut self) -> &mut StateActionTable<S, A> {
        &mut self.q_values
    }

    /// One-step temporal-difference error for the observed transition.
    ///
    /// Bootstraps on the best successor value; which tied successor action is
    /// "the" maximizer never changes the bootstrapped value, so the max is
    /// taken directly.
    pub(crate) fn prediction_error(
        &self,
        state: &S,
        action: &A,
        response: f64,
    ) -> Result<f64, LearnerError> {
        let next_state = self.mdp.next_state(state, action);
        let next_row = self.q_values.row(&next_state)?;
        let max_next_q = next_row
            .values()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let current = self.q_values.get(state, action)?;
        Ok(response + self.discount_factor * max_next_q - current)
    }

    pub(crate) fn select_action(&mut self, state: &S) -> Result<A, LearnerError> {
        let row = self.q_values.row(state)?;
        let actions: Vec<A> = row.keys().cloned().collect();
        let values: Vec<f64> = row.values().cloned().collect();
        let index = self.action_selection.select(&mut self.rng, &values);
        Ok(actions[index].clone())
    }
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> Learner<S, A> for QLearner<S, A> {
    fn request_action(&mut self, state: &S) -> Result<A, LearnerError> {
        self.select_action(state)
    }

    fn process_feedback(
        &mut self,
        state: &S,
        action: &A,
        response: f64,
    ) -> Result<(), LearnerError> {
        let pred_error = self.prediction_error(state, action, response)?;
        debug!(pred_error, "one-step temporal difference");
        self.q_values
            .add(state, action, self.learning_rate * pred_error)
    }

    fn get_info(&mut self) -> LearnerInfo<S, A> {
        LearnerInfo::QValues(self.q_values.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_selection::EpsilonGreedy;
    use crate::mdp::testing::{MarkedMdp, SingleActionMdp, TwoStateMdp};

    fn learner(
        discount_factor: f64,
        learning_rate: f64,
        init_q: f64,
        seed: u64,
    ) -> QLearner<&'static str, &'static str> {
        QLearner::new(
            Rc::new(TwoStateMdp),
            discount_factor,
            learning_rate,
            init_q,
            EnumActionSelection::from(EpsilonGreedy::new(0.1)),
            seed,
        )
        .unwrap()
    }

    #[test]
    fn one_step_update_matches_hand_computation() {
        // A --right--> B, reward 10, everything else zero
        let mut q = learner(0.9, 0.5, 0.0, 1);
        q.process_feedback(&"A", &"right", 10.0).unwrap();
        assert_eq!(q.q_values().get(&"A", &"right").unwrap(), 5.0);
        assert_eq!(q.q_values().get(&"A", &"left").unwrap(), 0.0);
    }

    #[test]
    fn first_update_from_nonzero_init_is_exact() {
        let mut q = learner(0.0, 0.25, 0.4, 1);
        q.process_feedback(&"A", &"left", 2.0).unwrap();
        // Q = Q0 + lr * (r - Q0)
        assert!((q.q_values().get(&"A", &"left").unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn zero_discount_drives_q_monotonically_toward_the_reward() {
        let mut q = learner(0.0, 0.5, 0.0, 1);
        let mut previous = 0.0;
        for _ in 0..20 {
            q.process_feedback(&"A", &"left", 1.0).unwrap();
            let current = q.q_values().get(&"A", &"left").unwrap();
            assert!(current > previous);
            assert!(current <= 1.0);
            previous = current;
        }
        assert!((previous - 1.0).abs() < 1e-4);
    }

    #[test]
    fn single_action_states_are_deterministic_for_any_seed() {
        for seed in 0..20 {
            let mut q = QLearner::new(
                Rc::new(SingleActionMdp),
                0.9,
                0.5,
                0.0,
                EnumActionSelection::from(EpsilonGreedy::new(0.5)),
                seed,
            )
            .unwrap();
            assert_eq!(q.request_action(&"S").unwrap(), "only");
        }
    }

    #[test]
    fn terminal_marker_starts_at_zero_and_others_at_init_q() {
        let q = QLearner::new(
            Rc::new(MarkedMdp),
            0.9,
            0.5,
            0.6,
            EnumActionSelection::from(EpsilonGreedy::new(0.1)),
            1,
        )
        .unwrap();
        assert_eq!(q.q_values().get(&"A", &"%").unwrap(), 0.0);
        assert_eq!(q.q_values().get(&"A", &"right").unwrap(), 0.6);
    }

    #[test]
    fn unknown_state_fails_loudly() {
        let mut q = learner(0.9, 0.5, 0.0, 1);
        assert!(matches!(
            q.request_action(&"Z"),
            Err(LearnerError::UnknownState(_))
        ));
        assert!(matches!(
            q.process_feedback(&"A", &"jump", 1.0),
            Err(LearnerError::UnknownAction { .. })
        ));
    }
}
