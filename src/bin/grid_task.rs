use std::rc::Rc;

use kdam::tqdm;
use plotters::style::colors::{BLUE, GREEN, MAGENTA, RED};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use structopt::StructOpt;

use mdp_learners::action_selection::{EnumActionSelection, EpsilonGreedy, Softmax};
use mdp_learners::mdp::{GridMove, GridPos, GridWorld};
use mdp_learners::table::FxIndexMap;
use mdp_learners::utils::{moving_average, plot_moving_average, save_json};
use mdp_learners::{
    ActionSignallingLearner, EnumLearner, Learner, Mdp, ModelBasedLearner, QLearner, TraceQLearner,
};

/// Trains every learner on the same grid task: a hidden target policy hands
/// out +1 when the requested action matches it and -1 otherwise.
#[derive(StructOpt, Debug)]
#[structopt(name = "grid_task")]
struct Cli {
    /// Width and height of the square grid
    #[structopt(long = "grid_size", default_value = "4")]
    grid_size: usize,
    /// Number of action/feedback trials per learner
    #[structopt(long = "n_trials", default_value = "2000")]
    n_trials: usize,
    /// Trials between episode resets
    #[structopt(long = "episode_length", default_value = "25")]
    episode_length: usize,
    #[structopt(long = "learning_rate", default_value = "0.3")]
    learning_rate: f64,
    #[structopt(long = "discount_factor", default_value = "0.9")]
    discount_factor: f64,
    /// Exploration rate (epsilon-greedy and the planner/signalling learners)
    #[structopt(long = "random_choose", default_value = "0.1")]
    random_choose: f64,
    /// Softmax temperature, used with --softmax
    #[structopt(long = "temperature", default_value = "0.5")]
    temperature: f64,
    /// Select actions by softmax instead of epsilon-greedy
    #[structopt(long = "softmax")]
    softmax: bool,
    #[structopt(long = "init_q", default_value = "0.0")]
    init_q: f64,
    #[structopt(long = "init_reward", default_value = "0.0")]
    init_reward: f64,
    #[structopt(long = "trace_decay", default_value = "0.8")]
    trace_decay: f64,
    #[structopt(long = "seed", default_value = "42")]
    seed: u64,
    /// Number of points on the accuracy curves
    #[structopt(long = "moving_average_window", default_value = "20")]
    moving_average_window: usize,
}

/// The policy the feedback-giver rewards: the first available move in the
/// order Right, Down, Up, Left.
fn target_policy(grid: &GridWorld) -> FxIndexMap<GridPos, GridMove> {
    let preference = [
        GridMove::Right,
        GridMove::Down,
        GridMove::Up,
        GridMove::Left,
    ];
    let mut policy = FxIndexMap::default();
    for state in grid.states() {
        let available = grid.available_actions(&state);
        let choice = preference
            .iter()
            .find(|m| available.contains(m))
            .copied()
            .unwrap();
        policy.insert(state, choice);
    }
    policy
}

/// One corner-seeking candidate policy for the signalling learner.
fn corner_policy(grid: &GridWorld, target: GridPos) -> FxIndexMap<GridPos, GridMove> {
    let mut policy = FxIndexMap::default();
    for state in grid.states() {
        let choice = if state.x > target.x {
            GridMove::Left
        } else if state.x < target.x {
            GridMove::Right
        } else if state.y > target.y {
            GridMove::Up
        } else if state.y < target.y {
            GridMove::Down
        } else {
            grid.available_actions(&state)[0]
        };
        policy.insert(state, choice);
    }
    policy
}

fn run_learner(
    name: &str,
    learner: &mut EnumLearner<GridPos, GridMove>,
    grid: &GridWorld,
    target: &FxIndexMap<GridPos, GridMove>,
    cli: &Cli,
    rng: &mut StdRng,
) -> Result<Vec<f64>, Box<dyn std::error::Error>> {
    let states = grid.states();
    let mut state = states[rng.gen_range(0..states.len())];
    let mut hits: Vec<f64> = Vec::with_capacity(cli.n_trials);

    for trial in tqdm!(0..cli.n_trials, desc = name.to_string()) {
        if trial % cli.episode_length == 0 {
            state = states[rng.gen_range(0..states.len())];
            if let EnumLearner::TraceQLearner(t) = learner {
                t.reset_eligibility_traces();
            }
        }
        let action = learner.request_action(&state)?;
        let matched = target[&state] == action;
        let response = if matched { 1.0 } else { -1.0 };
        learner.process_feedback(&state, &action, response)?;
        hits.push(if matched { 1.0 } else { 0.0 });
        state = grid.next_state(&state, &action);
    }
    Ok(moving_average(
        cli.n_trials / cli.moving_average_window.max(1),
        &hits,
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::from_args();
    if cli.grid_size < 2 {
        // a single cell offers no moves and the corner list needs 4 distinct
        // positions
        return Err(format!("grid_size must be at least 2, got {}", cli.grid_size).into());
    }

    let grid = Rc::new(GridWorld::new(cli.grid_size, cli.grid_size));
    let target = target_policy(&grid);
    let mut rng = StdRng::seed_from_u64(cli.seed);

    let selection = || -> EnumActionSelection {
        if cli.softmax {
            Softmax::new(cli.temperature).into()
        } else {
            EpsilonGreedy::new(cli.random_choose).into()
        }
    };

    let corners = [
        GridPos { x: 0, y: 0 },
        GridPos {
            x: cli.grid_size - 1,
            y: 0,
        },
        GridPos {
            x: 0,
            y: cli.grid_size - 1,
        },
        GridPos {
            x: cli.grid_size - 1,
            y: cli.grid_size - 1,
        },
    ];
    let candidates = Rc::new(
        corners
            .iter()
            .map(|c| corner_policy(&grid, *c))
            .collect::<Vec<_>>(),
    );
    let priors = vec![1.0 / corners.len() as f64; corners.len()];

    let mut learners: Vec<(&str, EnumLearner<GridPos, GridMove>)> = vec![
        (
            "q_learning",
            QLearner::new(
                grid.clone() as Rc<dyn Mdp<GridPos, GridMove>>,
                cli.discount_factor,
                cli.learning_rate,
                cli.init_q,
                selection(),
                cli.seed,
            )?
            .into(),
        ),
        (
            "trace_q_learning",
            TraceQLearner::new(
                grid.clone() as Rc<dyn Mdp<GridPos, GridMove>>,
                cli.discount_factor,
                cli.learning_rate,
                cli.init_q,
                selection(),
                cli.trace_decay,
                cli.seed,
            )?
            .into(),
        ),
        (
            "model_based",
            ModelBasedLearner::new(
                grid.as_ref(),
                cli.discount_factor,
                cli.learning_rate,
                cli.random_choose,
                cli.init_reward,
                cli.seed,
            )?
            .into(),
        ),
        (
            "action_signalling",
            ActionSignallingLearner::new(
                grid.clone() as Rc<dyn Mdp<GridPos, GridMove>>,
                cli.random_choose,
                candidates,
                priors,
                cli.seed,
            )?
            .into(),
        ),
    ];

    let mut curves: Vec<Vec<f64>> = vec![];
    let mut legends: Vec<&str> = vec![];
    for (name, learner) in learners.iter_mut() {
        let name: &str = *name;
        let curve = run_learner(name, learner, &grid, &target, &cli, &mut rng)?;
        curves.push(curve);
        legends.push(name);
    }

    plot_moving_average(
        &curves,
        &[&BLUE, &GREEN, &RED, &MAGENTA],
        &legends,
        "Grid Task Accuracy",
    )?;

    let results: serde_json::Value = json!({
        "grid_size": cli.grid_size,
        "n_trials": cli.n_trials,
        "seed": cli.seed,
        "accuracy_curves": legends
            .iter()
            .zip(curves.iter())
            .map(|(name, curve)| (name.to_string(), curve.clone()))
            .collect::<std::collections::BTreeMap<_, _>>(),
    });
    save_json("grid_task_results.json", results)?;
    Ok(())
}
