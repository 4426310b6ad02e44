mod action_signalling;
mod model_based;
mod q_learner;
mod trace_q_learner;

use std::fmt::Debug;
use std::hash::Hash;

use enum_dispatch::enum_dispatch;

pub use action_signalling::ActionSignallingLearner;
pub use model_based::ModelBasedLearner;
pub use q_learner::QLearner;
pub use trace_q_learner::TraceQLearner;

use crate::error::LearnerError;
use crate::table::FxIndexMap;

/// Snapshot of a learner's internal estimates, for harness display/logging.
#[derive(Debug, Clone)]
pub enum LearnerInfo<S, A> {
    QValues(FxIndexMap<S, FxIndexMap<A, f64>>),
    RewardFunction(FxIndexMap<S, FxIndexMap<A, f64>>),
    MapPolicy(FxIndexMap<S, A>),
}

/// The two-operation contract every learner exposes to the task harness,
/// plus a snapshot read-back. The harness alternates strictly between
/// `request_action` and `process_feedback`, one pair per trial.
#[enum_dispatch]
pub trait Learner<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> {
    fn request_action(&mut self, state: &S) -> Result<A, LearnerError>;

    fn process_feedback(&mut self, state: &S, action: &A, response: f64)
        -> Result<(), LearnerError>;

    fn get_info(&mut self) -> LearnerInfo<S, A>;
}

#[enum_dispatch(Learner<S, A>)]
pub enum EnumLearner<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> {
    QLearner(QLearner<S, A>),
    TraceQLearner(TraceQLearner<S, A>),
    ModelBasedLearner(ModelBasedLearner<S, A>),
    ActionSignallingLearner(ActionSignallingLearner<S, A>),
}
