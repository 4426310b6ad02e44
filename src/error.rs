use thiserror::Error;

/// Errors surfaced by the learner cores.
///
/// Construction-time variants are configuration errors and are not
/// recoverable; `UnknownState`/`UnknownAction` are caller contract violations.
/// Numerical degeneracy (softmax or posterior normalization) is clamped
/// rather than reported, and an exhausted policy-iteration budget is a
/// defined termination path, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LearnerError {
    #[error("state {0} has no available actions")]
    EmptyActionSet(String),

    #[error("{policies} candidate policies but {probs} prior probabilities")]
    PolicyCountMismatch { policies: usize, probs: usize },

    #[error("the candidate policy set is empty")]
    EmptyPolicySet,

    #[error("candidate policy {index} prescribes unavailable action {action} at state {state}")]
    InvalidPolicyAction {
        index: usize,
        state: String,
        action: String,
    },

    #[error("transition from {state} via {action} leaves the enumerated state set")]
    UnreachableState { state: String, action: String },

    #[error("unknown state {0}")]
    UnknownState(String),

    #[error("unknown action {action} at state {state}")]
    UnknownAction { state: String, action: String },
}
