use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::action_selection::EnumActionSelection;
use crate::error::LearnerError;
use crate::learner::{Learner, LearnerInfo, QLearner};
use crate::mdp::Mdp;
use crate::table::StateActionTable;

/// Q-learning with replacing eligibility traces.
///
/// Each feedback event sets the visited pair's trace to exactly 1, zeroes the
/// sibling actions at that state, then sweeps the whole table applying
/// `Q += lr * delta * e` and decaying `e *= gamma * lambda`. The sweep is
/// O(|S| x |A|) per update, a deliberate simplicity trade-off for the small
/// discrete MDPs this crate targets.
pub struct TraceQLearner<S, A> {
    core: QLearner<S, A>,
    trace_decay: f64,
    eligibility_trace: StateActionTable<S, A>,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> TraceQLearner<S, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mdp: Rc<dyn Mdp<S, A>>,
        discount_factor: f64,
        learning_rate: f64,
        init_q: f64,
        action_selection: EnumActionSelection,
        trace_decay: f64,
        seed: u64,
    ) -> Result<Self, LearnerError> {
        let eligibility_trace = StateActionTable::from_mdp(mdp.as_ref(), 0.0)?;
        let core = QLearner::new(
            mdp,
            discount_factor,
            learning_rate,
            init_q,
            action_selection,
            seed,
        )?;
        Ok(Self {
            core,
            trace_decay,
            eligibility_trace,
        })
    }

    pub fn q_values(&self) -> &StateActionTable<S, A> {
        self.core.q_values()
    }

    pub fn eligibility_trace(&self) -> &StateActionTable<S, A> {
        &self.eligibility_trace
    }

    /// Zeroes every trace. The harness calls this between independent
    /// learning epochs; it is never invoked automatically.
    pub fn reset_eligibility_traces(&mut self) {
        self.eligibility_trace.fill(0.0);
    }
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> Learner<S, A>
    for TraceQLearner<S, A>
{
    fn request_action(&mut self, state: &S) -> Result<A, LearnerError> {
        self.core.select_action(state)
    }

    fn process_feedback(
        &mut self,
        state: &S,
        action: &A,
        response: f64,
    ) -> Result<(), LearnerError> {
        let pred_error = self.core.prediction_error(state, action, response)?;
        debug!(pred_error, "temporal difference");

        // replacing trace: the taken action becomes the only eligible action
        // at this state
        let row = self.eligibility_trace.row_mut(state)?;
        if !row.contains_key(action) {
            return Err(LearnerError::UnknownAction {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
            });
        }
        for value in row.values_mut() {
            *value = 0.0;
        }
        self.eligibility_trace.set(state, action, 1.0)?;

        let scale = self.core.learning_rate() * pred_error;
        let decay = self.core.discount_factor() * self.trace_decay;
        for (trace_state, trace_row) in self.eligibility_trace.iter_mut() {
            for (trace_action, trace) in trace_row.iter_mut() {
                self.core
                    .q_values_mut()
                    .add(trace_state, trace_action, scale * *trace)?;
                *trace *= decay;
            }
        }
        Ok(())
    }

    fn get_info(&mut self) -> LearnerInfo<S, A> {
        LearnerInfo::QValues(self.core.q_values().snapshot())
    }
}
