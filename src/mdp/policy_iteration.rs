use super::action_selector::ActionSelector;
use super::config::SolverConfig;
use super::grid_world::{Action, CellKind, GridWorld};
use super::solver::{max_abs_diff, Solver, Sweep};
use super::transition::TransitionModel;
use super::{PolicyGrid, UtilityGrid};
use crate::error::{Error, Result};

/// Policy iteration solver.
///
/// Every round evaluates the current policy with one double-buffered sweep
/// (only the policy's own action is scored, no max over actions), then
/// improves the policy greedily from the freshly evaluated utilities. All
/// walkable cells start out pointing `Up`.
///
/// With `stop_when_stable` set the run ends as soon as an improvement pass
/// leaves every action unchanged. Evaluation is a single sweep, so a stable
/// policy does not imply converged utilities.
#[derive(Debug, Clone)]
pub struct PolicyIteration<'g> {
    selector: ActionSelector<'g>,
    config: SolverConfig,
    utilities: UtilityGrid,
    policy: PolicyGrid,
    rounds: usize,
}

impl<'g> PolicyIteration<'g> {
    pub fn new(grid: &'g GridWorld, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let model = TransitionModel::new(grid, config.transition)?;
        let policy = PolicyGrid::from_shape_fn(grid.dim(), |(row, col)| {
            (!grid.is_obstacle((row, col).into())).then_some(Action::Up)
        });
        Ok(Self {
            selector: ActionSelector::new(model),
            utilities: UtilityGrid::zeros(grid.dim()),
            policy,
            rounds: 0,
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of evaluation/improvement rounds performed so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Recomputes every utility under the current fixed policy and returns the
    /// largest change. Obstacles and cells without an action get no future
    /// term.
    pub fn evaluate(&mut self) -> Result<f64> {
        let grid = self.selector.grid();
        let model = self.selector.model();
        let mut next = UtilityGrid::zeros(grid.dim());

        for cell in grid.cells() {
            let kind = grid.kind_of(cell)?;
            if kind == CellKind::Obstacle {
                continue;
            }
            let future = match self.policy[cell.index()] {
                Some(action) => model.expected_value(&self.utilities, cell, action),
                None => 0.0,
            };
            next[cell.index()] = self.config.rewards.reward(kind) + self.config.discount * future;
        }

        let max_delta = max_abs_diff(&next, &self.utilities);
        self.utilities = next;
        Ok(max_delta)
    }

    /// Replaces the whole policy with the greedy policy for the current
    /// utilities and returns how many cells changed action.
    pub fn improve(&mut self) -> Result<usize> {
        let grid = self.selector.grid();
        let mut next = PolicyGrid::from_elem(grid.dim(), None);

        for cell in grid.cells() {
            if grid.is_obstacle(cell) {
                continue;
            }
            next[cell.index()] = match self.selector.best_action(&self.utilities, cell) {
                Ok(choice) => Some(choice.action),
                // Single-cell world: nothing to choose.
                Err(Error::NoLegalAction { .. }) => None,
                Err(err) => return Err(err),
            };
        }

        let changes = next
            .iter()
            .zip(self.policy.iter())
            .filter(|(new, old)| new != old)
            .count();
        self.policy = next;
        Ok(changes)
    }
}

impl Solver for PolicyIteration<'_> {
    fn name(&self) -> &'static str {
        "policy iteration"
    }

    fn planned_steps(&self) -> usize {
        self.config.iterations
    }

    fn step(&mut self) -> Result<Sweep> {
        let max_delta = self.evaluate()?;
        let policy_changes = self.improve()?;
        let sweep = Sweep {
            iteration: self.rounds,
            max_delta,
            policy_changes,
        };
        self.rounds += 1;
        Ok(sweep)
    }

    fn is_converged(&self, sweep: &Sweep) -> bool {
        self.config.stop_when_stable && sweep.policy_changes == 0
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
    use crate::mdp::grid_world::{Cell, GridLayout};
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_policy_is_up() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let solver = PolicyIteration::new(&grid, SolverConfig::default()).unwrap();
        for cell in grid.cells() {
            let expected = if grid.is_obstacle(cell) { None } else { Some(Action::Up) };
            assert_eq!(solver.policy()[cell.index()], expected);
        }
    }

    #[test]
    fn test_evaluation_scores_only_policy_action() {
        // 1x2: empty | goal. The initial Up policy bounces back everywhere.
        let mut layout = GridLayout::empty(1, 2);
        layout.goals.push(Cell::new(0, 1));
        let grid = GridWorld::new(&layout).unwrap();
        let config = SolverConfig {
            discount: 0.5,
            ..SolverConfig::default()
        };
        let mut solver = PolicyIteration::new(&grid, config).unwrap();

        solver.evaluate().unwrap();
        assert_eq!(solver.utilities()[[0, 0]], -0.04);
        assert_eq!(solver.utilities()[[0, 1]], 1.0);

        // Still Up: (0, 0) drifts right into the goal with probability 0.1 and
        // otherwise stays put.
        solver.evaluate().unwrap();
        let expected = -0.04 + 0.5 * (0.8 * -0.04 + 0.1 * 1.0 + 0.1 * -0.04);
        assert_relative_eq!(solver.utilities()[[0, 0]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_improvement_overwrites_policy() {
        let mut layout = GridLayout::empty(1, 2);
        layout.goals.push(Cell::new(0, 1));
        let grid = GridWorld::new(&layout).unwrap();
        let mut solver = PolicyIteration::new(&grid, SolverConfig::default()).unwrap();

        solver.evaluate().unwrap();
        let changes = solver.improve().unwrap();
        assert_eq!(changes, 2);
        assert_eq!(solver.policy()[[0, 0]], Some(Action::Right));
        assert_eq!(solver.policy()[[0, 1]], Some(Action::Left));

        assert_eq!(solver.improve().unwrap(), 0);
    }

    #[test]
    fn test_runs_configured_rounds() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let mut solver = PolicyIteration::new(&grid, SolverConfig::default()).unwrap();
        let solution = solver.solve().unwrap();
        assert_eq!(solution.sweeps, 50);
        assert_eq!(solver.rounds(), 50);
        assert!(!solution.converged);
    }

    #[test]
    fn test_stop_when_stable() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let config = SolverConfig {
            iterations: 500,
            stop_when_stable: true,
            ..SolverConfig::default()
        };
        let mut solver = PolicyIteration::new(&grid, config).unwrap();
        let solution = solver.solve().unwrap();
        assert!(solution.converged);
        assert!(solution.sweeps < 500);
    }

    #[test]
    fn test_obstacles_never_get_actions() {
        let grid = GridWorld::new(&GridLayout::default()).unwrap();
        let mut solver = PolicyIteration::new(&grid, SolverConfig::default()).unwrap();
        let solution = solver.solve().unwrap();
        for cell in grid.cells() {
            if grid.is_obstacle(cell) {
                assert_eq!(solution.policy[cell.index()], None);
                assert_eq!(solution.utilities[cell.index()], 0.0);
            } else {
                assert!(solution.policy[cell.index()].is_some());
            }
        }
    }
}
