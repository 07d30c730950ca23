//! Stochastic movement model.
//!
//! Attempting an action moves the agent in the intended direction with
//! probability `intended`, and into each perpendicular direction with
//! probability `drift`. Any outcome that would leave the grid or enter an
//! obstacle bounces back, leaving the agent where it started.

use serde::Deserialize;

use super::grid_world::{Action, Cell, GridWorld};
use super::UtilityGrid;
use crate::error::{Error, Result};

/// Outcome probabilities of a single attempted move.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionProbabilities {
    /// Probability of moving in the intended direction.
    pub intended: f64,
    /// Probability of drifting into each of the two perpendicular directions.
    pub drift: f64,
}

impl Default for TransitionProbabilities {
    fn default() -> Self {
        Self {
            intended: 0.8,
            drift: 0.1,
        }
    }
}

impl TransitionProbabilities {
    /// Checks that both probabilities lie in `[0, 1]` and that the three
    /// outcomes sum to 1.
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [("intended", self.intended), ("drift", self.drift)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!(
                    "{name} probability must be within [0, 1], got {p}"
                )));
            }
        }
        let total = self.intended + 2.0 * self.drift;
        // Allow a little floating error
        if (total - 1.0).abs() > 1e-9 {
            return Err(Error::InvalidConfig(format!(
                "transition probabilities must sum to 1.0, but intended + 2 * drift = {total}"
            )));
        }
        Ok(())
    }
}

/// Expected-utility evaluation of actions over a fixed grid.
#[derive(Debug, Clone, Copy)]
pub struct TransitionModel<'g> {
    grid: &'g GridWorld,
    probabilities: TransitionProbabilities,
}

impl<'g> TransitionModel<'g> {
    pub fn new(grid: &'g GridWorld, probabilities: TransitionProbabilities) -> Result<Self> {
        probabilities.validate()?;
        Ok(Self {
            grid,
            probabilities,
        })
    }

    pub fn grid(&self) -> &'g GridWorld {
        self.grid
    }

    /// An action is legal when its intended target is in bounds and walkable.
    /// Drift targets never make an action illegal.
    pub fn is_legal(&self, from: Cell, action: Action) -> bool {
        self.grid.neighbor(from, action).is_some()
    }

    /// Legal actions from `from`, in tie-break priority order.
    pub fn legal_actions(&self, from: Cell) -> impl Iterator<Item = Action> + '_ {
        Action::ALL
            .into_iter()
            .filter(move |&action| self.is_legal(from, action))
    }

    /// Utility of the cell the agent ends up in after moving from `from` in
    /// `direction`; bounces back to `from` at edges and obstacles.
    fn landing_utility(&self, utilities: &UtilityGrid, from: Cell, direction: Action) -> f64 {
        let landing = self.grid.neighbor(from, direction).unwrap_or(from);
        utilities[landing.index()]
    }

    /// Expected utility of attempting `action` from `from`, reading only the
    /// supplied snapshot:
    /// `intended * U(main) + drift * U(drift_1) + drift * U(drift_2)`.
    pub fn expected_value(&self, utilities: &UtilityGrid, from: Cell, action: Action) -> f64 {
        let [first, second] = action.drifts();
        self.probabilities.intended * self.landing_utility(utilities, from, action)
            + self.probabilities.drift * self.landing_utility(utilities, from, first)
            + self.probabilities.drift * self.landing_utility(utilities, from, second)
    }
}
