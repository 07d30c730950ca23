use log::trace;

use super::grid_world::{Action, Cell, GridWorld};
use super::transition::TransitionModel;
use super::UtilityGrid;
use crate::error::{Error, Result};

/// The greedy action for a cell and its expected utility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub action: Action,
    pub value: f64,
}

/// Picks the legal action with the highest expected utility.
///
/// Ties are broken by the fixed priority `Up > Down > Left > Right`: actions are
/// scanned in that order and a later action only replaces the running best
/// when its value is strictly greater.
#[derive(Debug, Clone, Copy)]
pub struct ActionSelector<'g> {
    model: TransitionModel<'g>,
}

impl<'g> ActionSelector<'g> {
    pub fn new(model: TransitionModel<'g>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &TransitionModel<'g> {
        &self.model
    }

    pub fn grid(&self) -> &'g GridWorld {
        self.model.grid()
    }

    /// Evaluates every legal action from `cell` against `utilities`.
    ///
    /// # Errors
    /// [`Error::NoLegalAction`] if no action from `cell` is legal.
    pub fn best_action(&self, utilities: &UtilityGrid, cell: Cell) -> Result<Choice> {
        let mut best: Option<Choice> = None;
        for action in self.model.legal_actions(cell) {
            let value = self.model.expected_value(utilities, cell, action);
            if best.map_or(true, |b| value > b.value) {
                best = Some(Choice { action, value });
            }
        }
        let choice = best.ok_or(Error::NoLegalAction { cell })?;
        trace!("{cell}: best action {} ({:.5})", choice.action, choice.value);
        Ok(choice)
    }
}
