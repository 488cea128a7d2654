use cozy_chess::{Color, Move};
use log::debug;

use crate::board::Rules;
use crate::session::gate::SessionGate;

/// One applied move and the SAN computed for it before it was played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ply {
    pub mv: Move,
    pub notation: Option<String>,
}

/// Played/undone move sequences kept in lockstep with the rules collaborator.
///
/// Every mutation goes through the rules collaborator in the same call, so
/// `played` always mirrors the collaborator's own move stack. `undone` is a
/// LIFO of plies that `redo` can replay; any fresh move discards it.
#[derive(Clone, Debug, Default)]
pub struct HistoryController {
    played: Vec<Ply>,
    undone: Vec<Ply>,
    revision: u64,
}

impl HistoryController {
    pub fn new() -> Self { Self::default() }

    /// Records and plays a move that the rules collaborator accepts as legal.
    pub fn apply_move<R: Rules + ?Sized>(&mut self, rules: &mut R, mv: Move) {
        debug_assert!(rules.is_legal(mv), "apply_move called with illegal move {}", mv);
        let notation = rules.to_algebraic(mv);
        if notation.is_none() { debug!("no notation for {}, keeping ply without it", mv); }
        self.played.push(Ply { mv, notation });
        self.undone.clear();
        rules.apply(mv);
        self.revision += 1;
    }

    /// Takes back the last ply. Returns false when there is nothing to undo.
    pub fn undo<R: Rules + ?Sized>(&mut self, rules: &mut R) -> bool {
        let Some(ply) = self.played.pop() else { return false };
        let reverted = rules.revert();
        debug_assert_eq!(reverted, Some(ply.mv), "rules collaborator out of sync with history");
        self.undone.push(ply);
        self.revision += 1;
        true
    }

    /// Replays the most recently undone ply. Returns false when there is none.
    pub fn redo<R: Rules + ?Sized>(&mut self, rules: &mut R) -> bool {
        let Some(ply) = self.undone.pop() else { return false };
        debug_assert!(rules.is_legal(ply.mv), "redo of {} no longer legal", ply.mv);
        rules.apply(ply.mv);
        self.played.push(ply);
        self.revision += 1;
        true
    }

    /// Rolls back to the human's turn while an automated opponent is active.
    ///
    /// If the last ply is the automated side's reply and there are at least
    /// two plies, both the reply and the human move before it are undone;
    /// otherwise a single ply is. The gate then withholds automated replies
    /// until the human moves again. Returns the number of plies undone.
    pub fn undo_to_human_turn<R: Rules + ?Sized>(&mut self, rules: &mut R, gate: &mut SessionGate) -> usize {
        let last_mover: Color = !rules.side_to_move();
        let count = if last_mover == gate.automated_side && self.played.len() >= 2 {
            2
        } else {
            self.played.len().min(1)
        };
        for _ in 0..count { self.undo(rules); }
        gate.allow_automated_reply = false;
        count
    }

    /// Forgets both sequences. The gate and the position are the caller's.
    pub fn reset(&mut self) {
        self.played.clear();
        self.undone.clear();
        self.revision += 1;
    }

    pub fn played(&self) -> &[Ply] { &self.played }

    /// Undone plies, next redo last.
    pub fn undone(&self) -> &[Ply] { &self.undone }

    pub fn last_move(&self) -> Option<Move> { self.played.last().map(|p| p.mv) }

    pub fn last_notation(&self) -> Option<&str> { self.played.last().and_then(|p| p.notation.as_deref()) }

    /// Notation projection of `played`; always the same length.
    pub fn san_history(&self) -> Vec<Option<&str>> {
        self.played.iter().map(|p| p.notation.as_deref()).collect()
    }

    pub fn len(&self) -> usize { self.played.len() }

    pub fn is_empty(&self) -> bool { self.played.is_empty() }

    pub fn can_redo(&self) -> bool { !self.undone.is_empty() }

    /// Bumped on every mutation; lets asynchronous replies detect that the
    /// position they were computed for is gone.
    pub fn revision(&self) -> u64 { self.revision }

    /// Moves the revision past `previous` so a history swapped in for another
    /// one never repeats a revision a pending reply was stamped with.
    pub fn continue_after(&mut self, previous: u64) { self.revision += previous + 1; }

    /// PGN movetext of the played moves. Missing notation prints as `?`.
    pub fn movetext(&self, first_move_number: u16, first_side: Color) -> String {
        let mut out = String::new();
        let mut number = first_move_number;
        let mut side = first_side;
        for (i, ply) in self.played.iter().enumerate() {
            let san = ply.notation.as_deref().unwrap_or("?");
            match side {
                Color::White => out.push_str(&format!("{}. {} ", number, san)),
                Color::Black if i == 0 => out.push_str(&format!("{}... {} ", number, san)),
                Color::Black => out.push_str(&format!("{} ", san)),
            }
            if side == Color::Black { number += 1; }
            side = !side;
        }
        out.trim_end().to_string()
    }
}
