//! Value iteration over a grid world: repeatedly applies the Bellman max-update
//! to every cell until the configured number of sweeps has run.
//!
//! Goal and penalty cells are not terminal. They keep receiving the full
//! Bellman update like any other walkable cell, so their utilities grow past
//! their immediate reward.

use super::action_selector::ActionSelector;
use super::config::SolverConfig;
use super::grid_world::{CellKind, GridWorld};
use super::solver::{max_abs_diff, Solver, Sweep};
use super::transition::TransitionModel;
use super::{PolicyGrid, UtilityGrid};
use crate::error::{Error, Result};

/// Value iteration solver.
///
/// Each sweep computes, for every cell and reading only the previous
/// utilities, `reward(kind) + discount * best expected value`, records the
/// greedy action as the running policy, and then swaps in the new grid.
///
/// # Examples
///
/// ```
/// use gridmdp::mdp::{GridLayout, GridWorld, Solver, SolverConfig, ValueIteration};
///
/// let grid = GridWorld::new(&GridLayout::default()).unwrap();
/// let mut solver = ValueIteration::new(&grid, SolverConfig::default()).unwrap();
/// let solution = solver.solve().unwrap();
///
/// // 50 iterations, counted from sweep 0.
/// assert_eq!(solution.sweeps, 51);
/// assert_eq!(solution.utilities.dim(), (6, 6));
/// ```
#[derive(Debug, Clone)]
pub struct ValueIteration<'g> {
    selector: ActionSelector<'g>,
    config: SolverConfig,
    utilities: UtilityGrid,
    policy: PolicyGrid,
    sweeps: usize,
}

impl<'g> ValueIteration<'g> {
    pub fn new(grid: &'g GridWorld, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let model = TransitionModel::new(grid, config.transition)?;
        Ok(Self {
            selector: ActionSelector::new(model),
            utilities: UtilityGrid::zeros(grid.dim()),
            policy: PolicyGrid::from_elem(grid.dim(), None),
            sweeps: 0,
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of sweeps performed so far.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
}

impl Solver for ValueIteration<'_> {
    fn name(&self) -> &'static str {
        "value iteration"
    }

    fn planned_steps(&self) -> usize {
        self.config.iterations.saturating_add(1)
    }

    fn step(&mut self) -> Result<Sweep> {
        let grid = self.selector.grid();
        let mut next = UtilityGrid::zeros(grid.dim());
        let mut policy_changes = 0;

        for cell in grid.cells() {
            let kind = grid.kind_of(cell)?;
            // Obstacles keep utility 0 and never get an action.
            if kind == CellKind::Obstacle {
                continue;
            }
            let choice = match self.selector.best_action(&self.utilities, cell) {
                Ok(choice) => Some(choice),
                // Only a single-cell world gets here; grid construction rejects
                // enclosed cells everywhere else.
                Err(Error::NoLegalAction { .. }) => None,
                Err(err) => return Err(err),
            };
            let future = choice.map_or(0.0, |c| c.value);
            next[cell.index()] = self.config.rewards.reward(kind) + self.config.discount * future;

            let action = choice.map(|c| c.action);
            if self.policy[cell.index()] != action {
                self.policy[cell.index()] = action;
                policy_changes += 1;
            }
        }

        let max_delta = max_abs_diff(&next, &self.utilities);
        self.utilities = next;
        let sweep = Sweep {
            iteration: self.sweeps,
            max_delta,
            policy_changes,
        };
        self.sweeps += 1;
        Ok(sweep)
    }

    fn is_converged(&self, sweep: &Sweep) -> bool {
        self.config
            .tolerance
            .is_some_and(|tolerance| sweep.max_delta < tolerance)
    }

    fn utilities(&self) -> &UtilityGrid {
        &self.utilities
    }

    fn policy(&self) -> &PolicyGrid {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::grid_world::{Action, Cell, GridLayout};
    use approx::assert_relative_eq;

    #[test]
    fn test_first_sweep_is_immediate_reward() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let mut solver = ValueIteration::new(&grid, SolverConfig::default()).unwrap();
        let sweep = solver.step().unwrap();
        assert_eq!(sweep.iteration, 0);

        let u = solver.utilities();
        assert_eq!(u[[0, 0]], 1.0);
        assert_eq!(u[[1, 1]], -1.0);
        assert_eq!(u[[5, 5]], -0.04);
        assert_eq!(u[[0, 1]], 0.0);
        assert_eq!(sweep.max_delta, 1.0);
    }

    #[test]
    fn test_second_sweep_reads_previous_snapshot() {
        // 1x3 corridor: goal | empty | empty.
        let mut layout = GridLayout::empty(1, 3);
        layout.goals.push(Cell::new(0, 0));
        let grid = GridWorld::new(&layout).unwrap();
        let config = SolverConfig {
            discount: 0.5,
            ..SolverConfig::default()
        };
        let mut solver = ValueIteration::new(&grid, config).unwrap();
        solver.step().unwrap();
        solver.step().unwrap();

        // After sweep 0: U = [1, -0.04, -0.04].
        // Sweep 1 at (0, 1): Left = 0.8 * 1 + 0.1 * -0.04 + 0.1 * -0.04 = 0.792.
        let u = solver.utilities();
        assert_relative_eq!(u[[0, 1]], -0.04 + 0.5 * 0.792, epsilon = 1e-12);
        // (0, 2) must read the old -0.04 at (0, 1), not the value computed above.
        // Left = 0.8 * -0.04 + 0.2 * -0.04 = -0.04.
        assert_relative_eq!(u[[0, 2]], -0.04 + 0.5 * -0.04, epsilon = 1e-12);
        assert_eq!(solver.policy()[[0, 1]], Some(Action::Left));
        assert_eq!(solver.policy()[[0, 2]], Some(Action::Left));
    }

    #[test]
    fn test_runs_iterations_plus_one_sweeps() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let config = SolverConfig {
            iterations: 7,
            ..SolverConfig::default()
        };
        let mut solver = ValueIteration::new(&grid, config).unwrap();
        let solution = solver.solve().unwrap();
        assert_eq!(solution.sweeps, 8);
        assert_eq!(solution.deltas.len(), 8);
        assert!(!solution.converged);
        assert_eq!(solver.sweeps(), 8);
    }

    #[test]
    fn test_goal_is_not_absorbing() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let mut solver = ValueIteration::new(&grid, SolverConfig::default()).unwrap();
        let solution = solver.solve().unwrap();
        // The goal keeps collecting discounted future value on top of its reward.
        assert!(solution.utilities[[0, 0]] > 1.0);
        assert!(solution.policy[[0, 0]].is_some());
    }

    #[test]
    fn test_tolerance_stops_early() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let config = SolverConfig {
            iterations: 10_000,
            discount: 0.9,
            tolerance: Some(1e-6),
            ..SolverConfig::default()
        };
        let mut solver = ValueIteration::new(&grid, config).unwrap();
        let solution = solver.solve().unwrap();
        assert!(solution.converged);
        assert!(solution.sweeps < 10_001);
        assert!(*solution.deltas.last().unwrap() < 1e-6);
    }

    #[test]
    fn test_unbounded_iterations_with_tolerance() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let config = SolverConfig {
            iterations: usize::MAX,
            tolerance: Some(1e-3),
            ..SolverConfig::default()
        };
        let mut solver = ValueIteration::new(&grid, config).unwrap();
        assert_eq!(solver.planned_steps(), usize::MAX);
        let solution = solver.solve().unwrap();
        assert!(solution.converged);
        assert_eq!(solution.deltas.len(), solution.sweeps);
        assert!(*solution.deltas.last().unwrap() < 1e-3);
    }

    #[test]
    fn test_observer_sees_every_sweep() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let mut solver = ValueIteration::new(&grid, SolverConfig::default()).unwrap();
        let mut reported = Vec::new();
        solver
            .solve_with(&mut |sweep: &Sweep, u: &UtilityGrid, _: &PolicyGrid| {
                if sweep.iteration % 5 == 0 {
                    reported.push((sweep.iteration, u[[0, 0]]));
                }
            })
            .unwrap();
        let iterations: Vec<_> = reported.iter().map(|(i, _)| *i).collect();
        assert_eq!(iterations, vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45, 50]);
        assert_eq!(reported[0].1, 1.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let config = SolverConfig {
            discount: -0.1,
            ..SolverConfig::default()
        };
        assert!(matches!(
            ValueIteration::new(&grid, config),
            Err(Error::InvalidConfig(_))
        ));
    }
}
