use std::fmt::Debug;
use std::hash::Hash;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::error::LearnerError;
use crate::mdp::Mdp;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// State x Action -> f64 table.
///
/// Built once from the provider's full enumeration at learner construction
/// and never resized afterwards; rows keep the provider's action order so
/// snapshots and policy signatures are deterministic. Backs the Q-table, the
/// eligibility-trace table and the reward-function estimate.
#[derive(Debug, Clone)]
pub struct StateActionTable<S, A> {
    values: FxIndexMap<S, FxIndexMap<A, f64>>,
}

impl<S: Hash + Eq + Clone + Debug, A: Hash + Eq + Clone + Debug> StateActionTable<S, A> {
    /// Initializes every entry to `init`, except the provider's terminal
    /// marker which always starts at zero. Fails fast on a state with no
    /// available actions.
    pub fn from_mdp(mdp: &dyn Mdp<S, A>, init: f64) -> Result<Self, LearnerError> {
        let terminal = mdp.terminal_action();
        let mut values: FxIndexMap<S, FxIndexMap<A, f64>> = FxIndexMap::default();
        for state in mdp.states() {
            let actions = mdp.available_actions(&state);
            if actions.is_empty() {
                return Err(LearnerError::EmptyActionSet(format!("{:?}", state)));
            }
            let mut row: FxIndexMap<A, f64> = FxIndexMap::default();
            for action in actions {
                let value = match &terminal {
                    Some(marker) if *marker == action => 0.0,
                    _ => init,
                };
                row.insert(action, value);
            }
            values.insert(state, row);
        }
        Ok(Self { values })
    }

    pub fn row(&self, state: &S) -> Result<&FxIndexMap<A, f64>, LearnerError> {
        self.values
            .get(state)
            .ok_or_else(|| LearnerError::UnknownState(format!("{:?}", state)))
    }

    pub fn row_mut(&mut self, state: &S) -> Result<&mut FxIndexMap<A, f64>, LearnerError> {
        self.values
            .get_mut(state)
            .ok_or_else(|| LearnerError::UnknownState(format!("{:?}", state)))
    }

    pub fn get(&self, state: &S, action: &A) -> Result<f64, LearnerError> {
        self.row(state)?
            .get(action)
            .copied()
            .ok_or_else(|| LearnerError::UnknownAction {
                state: format!("{:?}", state),
                action: format!("{:?}", action),
            })
    }

    pub fn entry_mut(&mut self, state: &S, action: &A) -> Result<&mut f64, LearnerError> {
        let state_repr = format!("{:?}", state);
        let action_repr = format!("{:?}", action);
        self.row_mut(state)?
            .get_mut(action)
            .ok_or(LearnerError::UnknownAction {
                state: state_repr,
                action: action_repr,
            })
    }

    pub fn add(&mut self, state: &S, action: &A, delta: f64) -> Result<(), LearnerError> {
        *self.entry_mut(state, action)? += delta;
        Ok(())
    }

    pub fn set(&mut self, state: &S, action: &A, value: f64) -> Result<(), LearnerError> {
        *self.entry_mut(state, action)? = value;
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        for row in self.values.values_mut() {
            for entry in row.values_mut() {
                *entry = value;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &FxIndexMap<A, f64>)> {
        self.values.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&S, &mut FxIndexMap<A, f64>)> {
        self.values.iter_mut()
    }

    pub fn snapshot(&self) -> FxIndexMap<S, FxIndexMap<A, f64>> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::testing::{DeadEndMdp, MarkedMdp, TwoStateMdp};

    #[test]
    fn initializes_every_pair_to_the_configured_value() {
        let table = StateActionTable::from_mdp(&TwoStateMdp, 0.5).unwrap();
        assert_eq!(table.get(&"A", &"left").unwrap(), 0.5);
        assert_eq!(table.get(&"B", &"right").unwrap(), 0.5);
    }

    #[test]
    fn terminal_marker_starts_at_zero() {
        let table = StateActionTable::from_mdp(&MarkedMdp, 0.7).unwrap();
        assert_eq!(table.get(&"A", &"%").unwrap(), 0.0);
        assert_eq!(table.get(&"A", &"left").unwrap(), 0.7);
    }

    #[test]
    fn empty_action_set_is_a_construction_error() {
        let result = StateActionTable::<&str, &str>::from_mdp(&DeadEndMdp, 0.0);
        assert!(matches!(result, Err(LearnerError::EmptyActionSet(_))));
    }

    #[test]
    fn unknown_keys_fail_loudly() {
        let table = StateActionTable::from_mdp(&TwoStateMdp, 0.0).unwrap();
        assert!(matches!(
            table.get(&"Z", &"left"),
            Err(LearnerError::UnknownState(_))
        ));
        assert!(matches!(
            table.get(&"A", &"jump"),
            Err(LearnerError::UnknownAction { .. })
        ));
    }

    #[test]
    fn fill_overwrites_every_entry() {
        let mut table = StateActionTable::from_mdp(&TwoStateMdp, 1.0).unwrap();
        table.fill(0.0);
        for (_, row) in table.iter() {
            assert!(row.values().all(|v| *v == 0.0));
        }
    }
}
