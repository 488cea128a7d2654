//! A play session: position, move history, opponent gating, selection and
//! display toggles in one record, driven by [`Intent`]s from the host.

pub mod coordinator;
pub mod gate;
pub mod history;
pub mod record;

use cozy_chess::{Color, Move, Piece, Square};
use log::{info, warn};

use crate::board::cozy::Position;
use crate::board::Rules;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::eval::Overlay;
use crate::opponent::ReplyWorker;
pub use coordinator::{EngineMoveCoordinator, ReplyOutcome};
pub use gate::{Mode, SessionGate, Side};
pub use history::{HistoryController, Ply};
pub use record::SessionRecord;

/// Inputs the host forwards from its players.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    SelectSquare(Square),
    AttemptMove { from: Square, to: Square, promotion: Option<Piece> },
    Undo,
    Redo,
    Reset,
    ToggleEngine,
    ToggleControlDisplay,
    ToggleWeaknessDisplay,
}

/// The square a player picked up and where it may go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    pub targets: Vec<Move>,
}

/// Per-frame status for the host's info bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    pub side_to_move: Color,
    pub ply_count: usize,
    pub fullmove_number: u16,
    pub last_move: Option<Move>,
    pub last_notation: Option<String>,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub game_over: bool,
    pub mode: Mode,
    pub engine_enabled: bool,
    pub reply_in_flight: bool,
    /// King square to highlight when the side to move is in check.
    pub checked_king: Option<Square>,
}

pub struct Session {
    start: Position,
    position: Position,
    history: HistoryController,
    gate: SessionGate,
    coordinator: EngineMoveCoordinator,
    selection: Option<Selection>,
    show_control: bool,
    show_weakness: bool,
}

impl Session {
    pub fn new(position: Position, gate: SessionGate, coordinator: EngineMoveCoordinator) -> Self {
        Self {
            start: position.clone(),
            position,
            history: HistoryController::new(),
            gate,
            coordinator,
            selection: None,
            show_control: true,
            show_weakness: true,
        }
    }

    /// Builds a session from config, starting the opponent for PvE. An
    /// opponent that fails to start turns the session into PvP for good.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let position = match &config.fen {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::startpos(),
        };
        let mut gate = SessionGate::new(config.mode, config.automated_side.into());
        let coordinator = if config.mode == Mode::Pve {
            match config.opponent.build().and_then(ReplyWorker::spawn) {
                Ok(worker) => {
                    info!("opponent {} plays {:?}", worker.name(), gate.automated_side);
                    EngineMoveCoordinator::new(Some(worker), config.think_time())
                }
                Err(e) => {
                    warn!("opponent unavailable ({}), continuing player vs player", e);
                    gate.degrade_to_pvp();
                    EngineMoveCoordinator::disabled()
                }
            }
        } else {
            EngineMoveCoordinator::disabled()
        };
        let mut session = Self::new(position, gate, coordinator);
        session.show_control = config.show_control;
        session.show_weakness = config.show_weakness;
        Ok(session)
    }

    pub fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::SelectSquare(sq) => self.select_square(sq),
            Intent::AttemptMove { from, to, promotion } => self.attempt_move(from, to, promotion),
            Intent::Undo => {
                self.selection = None;
                match self.gate.mode {
                    Mode::Pve => { self.history.undo_to_human_turn(&mut self.position, &mut self.gate); }
                    Mode::Pvp => { self.history.undo(&mut self.position); }
                }
            }
            Intent::Redo => {
                self.selection = None;
                self.history.redo(&mut self.position);
            }
            Intent::Reset => self.reset(),
            Intent::ToggleEngine => self.toggle_engine(),
            Intent::ToggleControlDisplay => self.show_control = !self.show_control,
            Intent::ToggleWeaknessDisplay => self.show_weakness = !self.show_weakness,
        }
    }

    /// One loop iteration on the opponent side: collect a finished reply,
    /// then ask for a new one if the gate allows.
    pub fn tick(&mut self) -> Option<ReplyOutcome> {
        let outcome = self.coordinator.poll_reply(&mut self.gate, &mut self.history, &mut self.position);
        self.coordinator.request_reply(&mut self.gate, &self.history, &self.position);
        outcome
    }

    /// Blocks up to `timeout` for the in-flight reply.
    pub fn wait_reply(&mut self, timeout: std::time::Duration) -> Option<ReplyOutcome> {
        self.coordinator.wait_reply(timeout, &mut self.gate, &mut self.history, &mut self.position)
    }

    fn select_square(&mut self, sq: Square) {
        if self.gate.is_automated_turn(self.position.side_to_move()) { return; }
        if let Some(sel) = self.selection.take() {
            if let Some(mv) = self.position.resolve_move(sel.square, sq, None) {
                self.play_human(mv);
                return;
            }
        }
        self.select_own_piece(sq);
    }

    fn attempt_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) {
        if self.gate.is_automated_turn(self.position.side_to_move()) { return; }
        match self.position.resolve_move(from, to, promotion) {
            Some(mv) => self.play_human(mv),
            None => {
                self.selection = None;
                self.select_own_piece(to);
            }
        }
    }

    fn select_own_piece(&mut self, sq: Square) {
        self.selection = match self.position.piece_at(sq) {
            Some((color, _)) if color == self.position.side_to_move() => {
                Some(Selection { square: sq, targets: self.position.legal_moves_from(sq) })
            }
            _ => None,
        };
    }

    fn play_human(&mut self, mv: Move) {
        self.history.apply_move(&mut self.position, mv);
        self.coordinator.on_human_move(&mut self.gate);
        self.selection = None;
    }

    fn reset(&mut self) {
        self.position = self.start.clone();
        self.history.reset();
        self.selection = None;
        self.gate.allow_automated_reply = true;
        info!("session reset");
    }

    fn toggle_engine(&mut self) {
        if !self.gate.engine_toggleable() { return; }
        if self.gate.engine_enabled {
            self.coordinator.disable_engine(&mut self.gate);
        } else {
            self.coordinator.enable_engine(&mut self.gate);
        }
    }

    pub fn overlay(&self) -> Overlay { Overlay::compute(&self.position) }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            side_to_move: self.position.side_to_move(),
            ply_count: self.history.len(),
            fullmove_number: self.position.fullmove_number(),
            last_move: self.history.last_move(),
            last_notation: self.history.last_notation().map(str::to_string),
            check: self.position.is_check(),
            checkmate: self.position.is_checkmate(),
            stalemate: self.position.is_stalemate(),
            game_over: self.position.is_game_over(),
            mode: self.gate.mode,
            engine_enabled: self.gate.engine_enabled,
            reply_in_flight: self.gate.reply_in_flight,
            checked_king: self.position.checked_king(),
        }
    }

    pub fn position(&self) -> &Position { &self.position }
    pub fn history(&self) -> &HistoryController { &self.history }
    pub fn gate(&self) -> &SessionGate { &self.gate }
    pub fn selection(&self) -> Option<&Selection> { self.selection.as_ref() }
    pub fn show_control(&self) -> bool { self.show_control }
    pub fn show_weakness(&self) -> bool { self.show_weakness }
    pub fn opponent_name(&self) -> Option<&str> { self.coordinator.opponent_name() }

    /// PGN movetext of the moves played from the starting position.
    pub fn pgn(&self) -> String {
        self.history.movetext(self.start.fullmove_number(), self.start.side_to_move())
    }

    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            start_fen: self.start.fen(),
            played: self.history.played().iter().map(|p| format!("{}", p.mv)).collect(),
            undone: self.history.undone().iter().map(|p| format!("{}", p.mv)).collect(),
        }
    }

    /// Replaces position and history with a saved record. Gate flags are kept.
    pub fn restore(&mut self, record: &SessionRecord) -> Result<()> {
        let (start, position, mut history) = record.replay()?;
        history.continue_after(self.history.revision());
        self.start = start;
        self.position = position;
        self.history = history;
        self.selection = None;
        Ok(())
    }
}
