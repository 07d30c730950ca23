use log::{debug, info};

use super::{PolicyGrid, UtilityGrid};
use crate::error::Result;

/// Summary of one completed sweep (value iteration) or evaluation/improvement
/// round (policy iteration).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// 0-based index of this sweep within the solver's lifetime.
    pub iteration: usize,
    /// Largest absolute utility change of any cell in this sweep.
    pub max_delta: f64,
    /// Number of cells whose assigned action changed.
    pub policy_changes: usize,
}

/// Final state of a solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub utilities: UtilityGrid,
    pub policy: PolicyGrid,
    /// Number of sweeps actually performed.
    pub sweeps: usize,
    /// `max_delta` of every sweep, in order.
    pub deltas: Vec<f64>,
    /// True when the run stopped early on its convergence criterion.
    pub converged: bool,
}

/// Receives the solver state after every sweep.
pub trait SweepObserver {
    fn observe(&mut self, sweep: &Sweep, utilities: &UtilityGrid, policy: &PolicyGrid);
}

impl<F> SweepObserver for F
where
    F: FnMut(&Sweep, &UtilityGrid, &PolicyGrid),
{
    fn observe(&mut self, sweep: &Sweep, utilities: &UtilityGrid, policy: &PolicyGrid) {
        self(sweep, utilities, policy)
    }
}

/// A fixed-point solver over a grid world, advanced one sweep at a time.
pub trait Solver {
    fn name(&self) -> &'static str;

    /// Number of steps a call to [`Solver::solve`] performs, absent early exit.
    fn planned_steps(&self) -> usize;

    /// Performs exactly one sweep, reading the previous utility grid and
    /// replacing it in full once every cell has been computed.
    fn step(&mut self) -> Result<Sweep>;

    /// Whether `sweep` meets the solver's optional early-exit criterion.
    fn is_converged(&self, sweep: &Sweep) -> bool;

    fn utilities(&self) -> &UtilityGrid;

    fn policy(&self) -> &PolicyGrid;

    fn solve(&mut self) -> Result<Solution> {
        self.solve_with(&mut |_: &Sweep, _: &UtilityGrid, _: &PolicyGrid| {})
    }

    /// Runs [`Solver::planned_steps`] further steps from the current state,
    /// notifying `observer` after each one.
    fn solve_with(&mut self, observer: &mut dyn SweepObserver) -> Result<Solution> {
        let planned = self.planned_steps();
        let mut deltas = Vec::new();
        let mut converged = false;

        for _ in 0..planned {
            let sweep = self.step()?;
            debug!(
                "{} sweep {}: max delta {:.6}, {} policy changes",
                self.name(),
                sweep.iteration,
                sweep.max_delta,
                sweep.policy_changes
            );
            deltas.push(sweep.max_delta);
            observer.observe(&sweep, self.utilities(), self.policy());
            if self.is_converged(&sweep) {
                info!("{} converged after sweep {}", self.name(), sweep.iteration);
                converged = true;
                break;
            }
        }

        info!(
            "{} finished {} sweeps (final max delta {:.6})",
            self.name(),
            deltas.len(),
            deltas.last().copied().unwrap_or(0.0)
        );
        Ok(Solution {
            utilities: self.utilities().clone(),
            policy: self.policy().clone(),
            sweeps: deltas.len(),
            deltas,
            converged,
        })
    }
}

/// Largest absolute element-wise difference between two equally shaped grids.
pub(crate) fn max_abs_diff(a: &UtilityGrid, b: &UtilityGrid) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
