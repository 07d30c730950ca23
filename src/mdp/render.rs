//! Plain-text rendering of utility and policy grids for console output.

use super::grid_world::{Cell, GridWorld};
use super::{PolicyGrid, UtilityGrid};

const OBSTACLE_SYMBOL: char = '#';
const UNDEFINED_SYMBOL: char = '-';

/// One line per row, each utility printed as `{:6.3}`.
pub fn format_utilities(utilities: &UtilityGrid) -> String {
    let mut out = String::new();
    for row in utilities.rows() {
        let line: Vec<String> = row.iter().map(|u| format!("{u:6.3}")).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

fn policy_symbol(grid: &GridWorld, policy: &PolicyGrid, cell: Cell) -> char {
    if grid.is_obstacle(cell) {
        return OBSTACLE_SYMBOL;
    }
    policy[cell.index()].map_or(UNDEFINED_SYMBOL, |action| action.symbol())
}

fn policy_row(grid: &GridWorld, policy: &PolicyGrid, row: usize) -> String {
    (0..grid.cols())
        .map(|col| policy_symbol(grid, policy, Cell::new(row, col)).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per row, one symbol per cell: `U D L R`, `#` for obstacles and
/// `-` for cells without an action.
pub fn format_policy(grid: &GridWorld, policy: &PolicyGrid) -> String {
    let mut out = String::new();
    for row in 0..grid.rows() {
        out.push_str(&policy_row(grid, policy, row));
        out.push('\n');
    }
    out
}

/// Iteration header followed by utilities and policy side by side.
pub fn format_report(
    iteration: usize,
    grid: &GridWorld,
    utilities: &UtilityGrid,
    policy: &PolicyGrid,
) -> String {
    let mut out = format!("Iteration: {iteration}\n");
    let rendered = format_utilities(utilities);
    for (row, line) in rendered.lines().enumerate() {
        out.push_str(&format!("{line}\t{}\n", policy_row(grid, policy, row)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::grid_world::{Action, GridLayout};

    fn small_grid() -> GridWorld {
        let mut layout = GridLayout::empty(2, 3);
        layout.obstacles.push(Cell::new(0, 1));
        GridWorld::new(&layout).unwrap()
    }

    #[test]
    fn test_format_utilities() {
        let u = UtilityGrid::from_shape_vec((2, 2), vec![1.0, -0.04, 12.3456, 0.0]).unwrap();
        assert_eq!(format_utilities(&u), " 1.000 -0.040\n12.346  0.000\n");
    }

    #[test]
    fn test_format_policy_symbols() {
        let grid = small_grid();
        let mut policy = PolicyGrid::from_elem(grid.dim(), None);
        policy[[0, 0]] = Some(Action::Down);
        policy[[1, 2]] = Some(Action::Right);
        assert_eq!(format_policy(&grid, &policy), "D # -\n- - R\n");
    }

    #[test]
    fn test_format_report() {
        let grid = small_grid();
        let u = UtilityGrid::zeros(grid.dim());
        let policy = PolicyGrid::from_elem(grid.dim(), Some(Action::Up));
        let report = format_report(5, &grid, &u, &policy);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], "Iteration: 5");
        assert_eq!(lines[1], " 0.000  0.000  0.000\tU # U");
        assert_eq!(lines.len(), 3);
        assert!(report.ends_with('\n'));
    }
}
