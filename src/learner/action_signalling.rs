use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::LearnerError;
use crate::learner::{Learner, LearnerInfo};
use crate::mdp::Mdp;
use crate::table::FxIndexMap;
use crate::utils::max_indices;

/// Sharpness of the sigmoid turning a scalar response into a likelihood.
const SIGMOID_SHARPNESS: f64 = 2.0;
/// Floor applied to likelihoods so the posterior normalizer stays positive.
const LIKELIHOOD_FLOOR: f64 = 1e-12;

/// Bayesian filter over a fixed, finite set of candidate policies.
///
/// Each observed (state, action, response) is treated as evidence about which
/// candidate the feedback-giver intends: a policy that prescribes the taken
/// action at that state is likely under positive responses and unlikely under
/// negative ones, via a logistic likelihood. No transition model is needed.
pub struct ActionSignallingLearner<S, A> {
    mdp: Rc<dyn Mdp<S, A>>,
    random_choose: f64,
    policies: Rc<Vec<FxIndexMap<S, A>>>,
    policy_probs: Array1<f64>,
    rng: StdRng,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> ActionSignallingLearner<S, A> {
    /// The candidate set is shared with the harness and never mutated here.
    /// Fails fast on an empty candidate set, a policy/prior length mismatch,
    /// or a candidate prescribing an action the provider does not offer.
    pub fn new(
        mdp: Rc<dyn Mdp<S, A>>,
        random_choose: f64,
        policies: Rc<Vec<FxIndexMap<S, A>>>,
        policy_probs: Vec<f64>,
        seed: u64,
    ) -> Result<Self, LearnerError> {
        if policies.is_empty() {
            return Err(LearnerError::EmptyPolicySet);
        }
        if policies.len() != policy_probs.len() {
            return Err(LearnerError::PolicyCountMismatch {
                policies: policies.len(),
                probs: policy_probs.len(),
            });
        }
        for (index, policy) in policies.iter().enumerate() {
            for (state, action) in policy {
                if !mdp.available_actions(state).contains(action) {
                    return Err(LearnerError::InvalidPolicyAction {
                        index,
                        state: format!("{:?}", state),
                        action: format!("{:?}", action),
                    });
                }
            }
        }
        Ok(Self {
            mdp,
            random_choose,
            policies,
            policy_probs: Array1::from(policy_probs),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn policy_probs(&self) -> &Array1<f64> {
        &self.policy_probs
    }

    /// A maximum-a-posteriori candidate policy, ties broken uniformly at
    /// random.
    pub fn get_policy(&mut self) -> FxIndexMap<S, A> {
        let probs = self.policy_probs.to_vec();
        let maximizers = max_indices(&probs);
        let pick = maximizers[self.rng.gen_range(0..maximizers.len())];
        self.policies[pick].clone()
    }

    /// Marginal action distribution per state implied by the posterior.
    /// Introspection only; the algorithm itself never reads this.
    pub fn get_action_probabilities(&self) -> FxIndexMap<S, FxIndexMap<A, f64>> {
        let mut expected: FxIndexMap<S, FxIndexMap<A, f64>> = FxIndexMap::default();
        for (policy, prob) in self.policies.iter().zip(self.policy_probs.iter()) {
            for (state, action) in policy {
                let row = expected
                    .entry(state.clone())
                    .or_insert_with(FxIndexMap::default);
                *row.entry(action.clone()).or_insert(0.0) += *prob;
            }
        }
        expected
    }
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> Learner<S, A>
    for ActionSignallingLearner<S, A>
{
    fn request_action(&mut self, state: &S) -> Result<A, LearnerError> {
        let actions = self.mdp.available_actions(state);
        if actions.is_empty() {
            return Err(LearnerError::EmptyActionSet(format!("{:?}", state)));
        }
        if actions.len() == 1 {
            return Ok(actions.into_iter().next().unwrap());
        }

        // marginalize the posterior into per-action mass at this state
        let mut action_mass = vec![0.0; actions.len()];
        for (policy, prob) in self.policies.iter().zip(self.policy_probs.iter()) {
            if let Some(prescribed) = policy.get(state) {
                if let Some(i) = actions.iter().position(|a| a == prescribed) {
                    action_mass[i] += *prob;
                }
            }
        }

        let maximizers = max_indices(&action_mass);
        let complement: Vec<usize> = (0..actions.len())
            .filter(|i| !maximizers.contains(i))
            .collect();
        let index = if self.rng.gen::<f64>() > self.random_choose || complement.is_empty() {
            maximizers[self.rng.gen_range(0..maximizers.len())]
        } else {
            complement[self.rng.gen_range(0..complement.len())]
        };
        Ok(actions[index].clone())
    }

    /// Candidate policies may be partial. A state no candidate mentions gives
    /// every policy the same non-matching likelihood, so the posterior is
    /// unchanged after renormalization; that is not a contract violation,
    /// unlike the table-backed learners where every state is enumerated.
    fn process_feedback(
        &mut self,
        state: &S,
        action: &A,
        response: f64,
    ) -> Result<(), LearnerError> {
        for (policy, prob) in self.policies.iter().zip(self.policy_probs.iter_mut()) {
            let matches = policy.get(state) == Some(action);
            let exponent = if matches {
                -SIGMOID_SHARPNESS * response
            } else {
                SIGMOID_SHARPNESS * response
            };
            let likelihood = (1.0 / (1.0 + exponent.exp())).max(LIKELIHOOD_FLOOR);
            *prob *= likelihood;
        }
        let normalization = self.policy_probs.sum();
        self.policy_probs /= normalization;
        debug!(normalization, "posterior renormalized");
        Ok(())
    }

    fn get_info(&mut self) -> LearnerInfo<S, A> {
        LearnerInfo::MapPolicy(self.get_policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::{OneStateTwoActionMdp, SingleActionMdp};

    fn candidates() -> Rc<Vec<FxIndexMap<&'static str, &'static str>>> {
        let mut left = FxIndexMap::default();
        left.insert("S", "left");
        let mut right = FxIndexMap::default();
        right.insert("S", "right");
        Rc::new(vec![left, right])
    }

    fn learner(
        random_choose: f64,
        seed: u64,
    ) -> ActionSignallingLearner<&'static str, &'static str> {
        ActionSignallingLearner::new(
            Rc::new(OneStateTwoActionMdp),
            random_choose,
            candidates(),
            vec![0.5, 0.5],
            seed,
        )
        .unwrap()
    }

    #[test]
    fn strong_positive_evidence_concentrates_the_posterior() {
        let mut l = learner(0.0, 1);
        l.process_feedback(&"S", &"left", 5.0).unwrap();
        // likelihoods 1/(1+e^-10) vs 1/(1+e^10)
        let probs = l.policy_probs();
        assert!((probs[0] - 0.99995).abs() < 1e-4);
        assert!(probs[1] < 1e-4);
        assert!((probs.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn posterior_always_sums_to_one() {
        let mut l = learner(0.1, 1);
        for (action, response) in [("left", 1.0), ("right", -2.0), ("left", 0.5), ("right", 3.0)] {
            l.process_feedback(&"S", &action, response).unwrap();
            assert!((l.policy_probs().sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn repeated_evidence_drives_the_matching_policy_toward_one() {
        let mut l = learner(0.0, 1);
        for _ in 0..20 {
            l.process_feedback(&"S", &"left", 1.0).unwrap();
        }
        assert!(l.policy_probs()[0] > 0.99);
        assert_eq!(l.get_policy()[&"S"], "left");
    }

    #[test]
    fn greedy_choice_follows_the_posterior_marginal() {
        let mut l = learner(0.0, 1);
        l.process_feedback(&"S", &"right", 4.0).unwrap();
        for _ in 0..20 {
            assert_eq!(l.request_action(&"S").unwrap(), "right");
        }
    }

    #[test]
    fn exploration_samples_the_non_maximizing_actions() {
        let mut l = learner(1.0, 1);
        l.process_feedback(&"S", &"right", 4.0).unwrap();
        for _ in 0..20 {
            assert_eq!(l.request_action(&"S").unwrap(), "left");
        }
    }

    #[test]
    fn single_action_states_bypass_selection() {
        let mut only = FxIndexMap::default();
        only.insert("S", "only");
        let mut l = ActionSignallingLearner::new(
            Rc::new(SingleActionMdp),
            1.0,
            Rc::new(vec![only]),
            vec![1.0],
            1,
        )
        .unwrap();
        for _ in 0..10 {
            assert_eq!(l.request_action(&"S").unwrap(), "only");
        }
    }

    #[test]
    fn mismatched_prior_length_is_a_construction_error() {
        let result = ActionSignallingLearner::new(
            Rc::new(OneStateTwoActionMdp),
            0.1,
            candidates(),
            vec![1.0],
            1,
        );
        assert!(matches!(
            result,
            Err(LearnerError::PolicyCountMismatch {
                policies: 2,
                probs: 1
            })
        ));
    }

    #[test]
    fn unavailable_prescription_is_a_construction_error() {
        let mut bogus = FxIndexMap::default();
        bogus.insert("S", "jump");
        let result = ActionSignallingLearner::new(
            Rc::new(OneStateTwoActionMdp),
            0.1,
            Rc::new(vec![bogus]),
            vec![1.0],
            1,
        );
        assert!(matches!(
            result,
            Err(LearnerError::InvalidPolicyAction { index: 0, .. })
        ));
    }

    #[test]
    fn empty_candidate_set_is_a_construction_error() {
        let result = ActionSignallingLearner::<&str, &str>::new(
            Rc::new(OneStateTwoActionMdp),
            0.1,
            Rc::new(vec![]),
            vec![],
            1,
        );
        assert!(matches!(result, Err(LearnerError::EmptyPolicySet)));
    }

    #[test]
    fn states_outside_every_candidate_leave_the_posterior_unchanged() {
        let partial: FxIndexMap<&'static str, &'static str> = FxIndexMap::default();
        let mut l = ActionSignallingLearner::new(
            Rc::new(OneStateTwoActionMdp),
            0.0,
            Rc::new(vec![partial.clone(), partial]),
            vec![0.3, 0.7],
            1,
        )
        .unwrap();
        l.process_feedback(&"S", &"left", 5.0).unwrap();
        let probs = l.policy_probs();
        assert!((probs[0] - 0.3).abs() < 1e-9);
        assert!((probs[1] - 0.7).abs() < 1e-9);
    }

    #[test]
    fn marginals_mirror_the_posterior() {
        let mut l = learner(0.0, 1);
        l.process_feedback(&"S", &"left", 1.0).unwrap();
        let marginals = l.get_action_probabilities();
        let row = &marginals[&"S"];
        assert!((row[&"left"] + row[&"right"] - 1.0).abs() < 1e-9);
        assert!(row[&"left"] > row[&"right"]);
    }
}
