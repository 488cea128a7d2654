// Board-control overlay, move history and opponent gating for a chess board
pub mod assets;
pub mod board;
pub mod config;
pub mod error;
pub mod eval;
pub mod opponent;
pub mod session;

pub use error::{Error, Result};
