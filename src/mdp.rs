use std::fmt::Debug;
use std::hash::Hash;

/// Markov Decision Process provider: the external collaborator the learners
/// are constructed against.
///
/// The state set must be finite and closed (every transition lands on an
/// enumerated state) and every state must offer at least one action. The
/// transition function is deterministic.
pub trait Mdp<S, A> {
    fn states(&self) -> Vec<S>;
    fn available_actions(&self, state: &S) -> Vec<A>;
    fn next_state(&self, state: &S, action: &A) -> S;

    /// Designated terminal/no-op action, if the task has one. Its value and
    /// reward estimates are initialized to zero instead of the configured
    /// initial value.
    fn terminal_action(&self) -> Option<A> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridMove {
    Up,
    Down,
    Left,
    Right,
}

/// Bounded rectangular grid with deterministic moves. Edge states only offer
/// the moves that stay inside the grid, so per-state action sets differ.
pub struct GridWorld {
    width: usize,
    height: usize,
}

impl GridWorld {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Mdp<GridPos, GridMove> for GridWorld {
    fn states(&self) -> Vec<GridPos> {
        let mut states = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                states.push(GridPos { x, y });
            }
        }
        states
    }

    fn available_actions(&self, state: &GridPos) -> Vec<GridMove> {
        let mut actions = vec![];
        if state.y > 0 {
            actions.push(GridMove::Up);
        }
        if state.y + 1 < self.height {
            actions.push(GridMove::Down);
        }
        if state.x > 0 {
            actions.push(GridMove::Left);
        }
        if state.x + 1 < self.width {
            actions.push(GridMove::Right);
        }
        actions
    }

    fn next_state(&self, state: &GridPos, action: &GridMove) -> GridPos {
        let GridPos { x, y } = *state;
        match action {
            GridMove::Up => GridPos {
                x,
                y: y.saturating_sub(1),
            },
            GridMove::Down => GridPos {
                x,
                y: (y + 1).min(self.height - 1),
            },
            GridMove::Left => GridPos {
                x: x.saturating_sub(1),
                y,
            },
            GridMove::Right => GridPos {
                x: (x + 1).min(self.width - 1),
                y,
            },
        }
    }
}
