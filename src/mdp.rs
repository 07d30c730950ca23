pub mod action_selector;
pub mod config;
pub mod grid_world;
pub mod policy_iteration;
pub mod render;
pub mod solver;
pub mod transition;
pub mod value_iteration;


use ndarray::Array2;

/// Current utility estimate per cell, indexed `[[row, col]]`.
pub type UtilityGrid = Array2<f64>;

/// Chosen action per cell; `None` means no action has been assigned.
pub type PolicyGrid = Array2<Option<Action>>;

pub use action_selector::{ActionSelector, Choice};
pub use config::{Config, RewardTable, SolverConfig};
pub use grid_world::{Action, Cell, CellKind, GridLayout, GridWorld};
pub use policy_iteration::PolicyIteration;
pub use render::{format_policy, format_report, format_utilities};
pub use solver::{Solution, Solver, Sweep, SweepObserver};
pub use transition::{TransitionModel, TransitionProbabilities};
pub use value_iteration::ValueIteration;
