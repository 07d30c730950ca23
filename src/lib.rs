pub mod error;
pub mod mdp;

pub use error::{Error, Result};
pub use mdp::{
    Action, Cell, CellKind, Config, GridLayout, GridWorld, PolicyGrid, PolicyIteration, Solution,
    Solver, SolverConfig, UtilityGrid, ValueIteration,
};
