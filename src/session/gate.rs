use cozy_chess::Color;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Both sides are moved by the host's players.
    #[default]
    Pvp,
    /// One side is played by the automated opponent.
    Pve,
}

/// Serializable stand-in for `cozy_chess::Color`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    #[default]
    Black,
}

impl From<Side> for Color {
    fn from(s: Side) -> Self {
        match s { Side::White => Color::White, Side::Black => Color::Black }
    }
}

impl From<Color> for Side {
    fn from(c: Color) -> Self {
        match c { Color::White => Side::White, Color::Black => Side::Black }
    }
}

/// Flags deciding whether the automated opponent may be asked for a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionGate {
    pub mode: Mode,
    pub original_mode: Mode,
    pub automated_side: Color,
    pub engine_enabled: bool,
    pub allow_automated_reply: bool,
    pub reply_in_flight: bool,
}

impl SessionGate {
    pub fn new(mode: Mode, automated_side: Color) -> Self {
        Self {
            mode,
            original_mode: mode,
            automated_side,
            engine_enabled: mode == Mode::Pve,
            allow_automated_reply: true,
            reply_in_flight: false,
        }
    }

    /// The opponent could not be started: the whole session becomes PvP,
    /// and re-enabling the engine later keeps it that way.
    pub fn degrade_to_pvp(&mut self) {
        self.mode = Mode::Pvp;
        self.original_mode = Mode::Pvp;
        self.engine_enabled = false;
        self.allow_automated_reply = false;
    }

    /// True while it is the automated side's move in PvE.
    pub fn is_automated_turn(&self, side_to_move: Color) -> bool {
        self.mode == Mode::Pve && side_to_move == self.automated_side
    }

    /// Whether an engine toggle makes sense for this session at all.
    pub fn engine_toggleable(&self) -> bool { self.original_mode == Mode::Pve }
}
