//! Static description of the grid environment: which kind of cell sits at each
//! coordinate, and the neighbor/validity queries the solvers build on.

use std::collections::HashMap;
use std::fmt;

use ndarray::Array2;
use serde::Deserialize;

use crate::error::{Error, Result};

/// A 0-indexed `(row, col)` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "(usize, usize)")]
pub struct Cell {
    /// Row index, counted from the top.
    pub row: usize,
    /// Column index, counted from the left.
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The coordinate one step in `action`'s intended direction, or `None` when
    /// that step would leave a `rows x cols` grid.
    pub fn step(self, action: Action, rows: usize, cols: usize) -> Option<Cell> {
        let (dr, dc) = action.offset();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < rows && col < cols).then_some(Cell { row, col })
    }

    pub(crate) fn index(self) -> [usize; 2] {
        [self.row, self.col]
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// What occupies a grid cell. Determines the immediate reward and whether the
/// agent may enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    /// Walkable cell with the small per-step reward.
    #[default]
    Empty,
    /// Walkable cell with a positive reward. Not terminal.
    Goal,
    /// Walkable cell with a negative reward. Not terminal.
    Penalty,
    /// Wall. Never entered, never assigned a utility or an action.
    Obstacle,
}

/// A movement the agent can attempt.
///
/// Each action has an intended direction and two perpendicular drift
/// directions the agent may slip into instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// Every action, in tie-break priority order (earlier wins a tie).
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// `(row, col)` displacement of the intended direction.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// The two perpendicular directions the agent may drift into.
    pub fn drifts(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Right, Action::Left],
            Action::Left | Action::Right => [Action::Down, Action::Up],
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Action::Up => 'U',
            Action::Down => 'D',
            Action::Left => 'L',
            Action::Right => 'R',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Literal description of a grid: its extents and the coordinates of every
/// non-empty cell. Unlisted cells are [`CellKind::Empty`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridLayout {
    #[serde(default = "default_extent")]
    pub rows: usize,
    #[serde(default = "default_extent")]
    pub cols: usize,
    #[serde(default)]
    pub goals: Vec<Cell>,
    #[serde(default)]
    pub penalties: Vec<Cell>,
    #[serde(default)]
    pub obstacles: Vec<Cell>,
}

fn default_extent() -> usize {
    6
}

/// Largest number of cells a grid may hold.
pub const MAX_CELLS: usize = 1 << 24;

impl GridLayout {
    /// An all-empty `rows x cols` layout.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            goals: Vec::new(),
            penalties: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

impl Default for GridLayout {
    /// The 6x6 maze with six goals, five penalties and five walls.
    fn default() -> Self {
        let cells = |coords: &[(usize, usize)]| -> Vec<Cell> {
            coords.iter().copied().map(Cell::from).collect()
        };
        Self {
            rows: 6,
            cols: 6,
            goals: cells(&[(0, 0), (0, 2), (0, 5), (1, 3), (2, 4), (3, 5)]),
            penalties: cells(&[(1, 1), (1, 5), (2, 2), (3, 3), (4, 4)]),
            obstacles: cells(&[(0, 1), (1, 4), (4, 1), (4, 2), (4, 3)]),
        }
    }
}

/// Immutable grid of cell kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorld {
    kinds: Array2<CellKind>,
}

impl GridWorld {
    /// Builds a grid from `layout`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] if the grid has a zero extent or more
    /// than [`MAX_CELLS`] cells, a listed coordinate falls outside it, a
    /// coordinate is listed under two kinds, or (in grids with more than one
    /// cell) a walkable cell has no legal move.
    pub fn new(layout: &GridLayout) -> Result<Self> {
        if layout.rows == 0 || layout.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                layout.rows, layout.cols
            )));
        }

        let size = layout
            .rows
            .checked_mul(layout.cols)
            .filter(|&size| size <= MAX_CELLS)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "grid of {}x{} exceeds the limit of {MAX_CELLS} cells",
                    layout.rows, layout.cols
                ))
            })?;

        let mut kinds = Array2::from_elem((layout.rows, layout.cols), CellKind::Empty);
        let mut claimed: HashMap<Cell, CellKind> = HashMap::new();
        let listed = [
            (CellKind::Goal, &layout.goals),
            (CellKind::Penalty, &layout.penalties),
            (CellKind::Obstacle, &layout.obstacles),
        ];
        for (kind, cells) in listed {
            for &cell in cells {
                if cell.row >= layout.rows || cell.col >= layout.cols {
                    return Err(Error::InvalidConfig(format!(
                        "{kind:?} cell {cell} lies outside the {}x{} grid",
                        layout.rows, layout.cols
                    )));
                }
                if let Some(previous) = claimed.insert(cell, kind) {
                    return Err(Error::InvalidConfig(format!(
                        "cell {cell} is listed as both {previous:?} and {kind:?}"
                    )));
                }
                kinds[cell.index()] = kind;
            }
        }

        let grid = Self { kinds };
        if size > 1 {
            let enclosed = grid.cells().find(|&cell| {
                !grid.is_obstacle(cell)
                    && Action::ALL
                        .iter()
                        .all(|&action| grid.neighbor(cell, action).is_none())
            });
            if let Some(cell) = enclosed {
                return Err(Error::InvalidConfig(format!(
                    "cell {cell} is enclosed and has no legal move"
                )));
            }
        }
        Ok(grid)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.kinds.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.kinds.ncols()
    }

    /// `(rows, cols)`, the shape of every utility and policy grid over this
    /// world.
    pub fn dim(&self) -> (usize, usize) {
        self.kinds.dim()
    }

    /// The kind of cell at `cell`.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if `cell` lies outside the grid.
    pub fn kind_of(&self, cell: Cell) -> Result<CellKind> {
        self.kinds.get(cell.index()).copied().ok_or(Error::OutOfBounds {
            cell,
            rows: self.rows(),
            cols: self.cols(),
        })
    }

    pub fn is_in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols()
    }

    /// True only for in-bounds obstacle cells.
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.kinds.get(cell.index()) == Some(&CellKind::Obstacle)
    }

    /// The cell reached by moving from `cell` in `action`'s intended direction,
    /// if that cell is inside the grid and walkable.
    pub fn neighbor(&self, cell: Cell, action: Action) -> Option<Cell> {
        cell.step(action, self.rows(), self.cols())
            .filter(|&next| !self.is_obstacle(next))
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.cols();
        (0..self.rows()).flat_map(move |row| (0..cols).map(move |col| Cell::new(row, col)))
    }
}
