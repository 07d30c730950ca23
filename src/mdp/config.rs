//! Solver parameters and the TOML configuration file format.
//!
//! Every section of the file is optional:
//!
//! ```toml
//! [grid]
//! rows = 3
//! cols = 4
//! goals = [[0, 3]]
//! penalties = [[1, 3]]
//! obstacles = [[1, 1]]
//!
//! [solver]
//! iterations = 100
//! discount = 0.9
//!
//! [solver.rewards]
//! empty = -0.04
//! goal = 1.0
//! penalty = -1.0
//!
//! [solver.transition]
//! intended = 0.8
//! drift = 0.1
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::grid_world::{CellKind, GridLayout};
use super::transition::TransitionProbabilities;
use crate::error::{Error, Result};

/// Immediate reward for entering each kind of cell. Obstacles never earn one.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewardTable {
    pub empty: f64,
    pub goal: f64,
    pub penalty: f64,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            empty: -0.04,
            goal: 1.0,
            penalty: -1.0,
        }
    }
}

impl RewardTable {
    pub fn reward(&self, kind: CellKind) -> f64 {
        match kind {
            CellKind::Empty => self.empty,
            CellKind::Goal => self.goal,
            CellKind::Penalty => self.penalty,
            CellKind::Obstacle => 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, r) in [("empty", self.empty), ("goal", self.goal), ("penalty", self.penalty)] {
            if !r.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{name} reward must be finite, got {r}"
                )));
            }
        }
        Ok(())
    }
}

/// Parameters shared by both solvers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Value iteration runs `iterations + 1` sweeps (sweep 0 included);
    /// policy iteration runs `iterations` evaluation/improvement rounds.
    pub iterations: usize,
    /// Weight of future utility, within `[0, 1)`.
    pub discount: f64,
    /// Immediate reward per cell kind.
    pub rewards: RewardTable,
    /// Movement probabilities of the agent.
    pub transition: TransitionProbabilities,
    /// Stop value iteration once a sweep changes no utility by this much.
    pub tolerance: Option<f64>,
    /// Stop policy iteration once an improvement pass changes no action.
    pub stop_when_stable: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            discount: 0.99,
            rewards: RewardTable::default(),
            transition: TransitionProbabilities::default(),
            tolerance: None,
            stop_when_stable: false,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.discount) {
            return Err(Error::InvalidConfig(format!(
                "discount factor must be within [0, 1), got {}",
                self.discount
            )));
        }
        if let Some(tolerance) = self.tolerance {
            if tolerance.is_nan() || tolerance <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "tolerance must be positive, got {tolerance}"
                )));
            }
        }
        self.rewards.validate()?;
        self.transition.validate()
    }
}

/// Everything needed for one run: the grid and the solver parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub grid: GridLayout,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.solver.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
