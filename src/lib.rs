pub mod action_selection;
pub mod error;
pub mod learner;
pub mod mdp;
pub mod table;
pub mod utils;

pub use error::LearnerError;
pub use learner::{
    ActionSignallingLearner, EnumLearner, Learner, LearnerInfo, ModelBasedLearner, QLearner,
    TraceQLearner,
};
pub use mdp::Mdp;
