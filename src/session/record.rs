use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::cozy::Position;
use crate::error::{Error, Result};
use crate::session::history::HistoryController;

/// Saved form of a session: the start position plus both move sequences in
/// UCI. `undone` keeps the history's order, next redo last.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start_fen: String,
    pub played: Vec<String>,
    #[serde(default)]
    pub undone: Vec<String>,
}

impl SessionRecord {
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Rebuilds start position, current position and history by playing the
    /// record through a fresh history, so notation and redo state come out
    /// exactly as if the moves had been entered.
    pub fn replay(&self) -> Result<(Position, Position, HistoryController)> {
        let start = Position::from_fen(&self.start_fen)?;
        let mut position = start.clone();
        let mut history = HistoryController::new();
        let redo_line = self.undone.iter().rev();
        for (ply, uci) in self.played.iter().chain(redo_line).enumerate() {
            let mv = position.parse_uci(uci).ok_or_else(|| Error::Replay {
                ply,
                source: Box::new(Error::InvalidMove { uci: uci.clone(), fen: position.fen() }),
            })?;
            history.apply_move(&mut position, mv);
        }
        for _ in 0..self.undone.len() { history.undo(&mut position); }
        Ok((start, position, history))
    }
}
