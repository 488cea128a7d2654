use std::path::PathBuf;

/// Errors at the fallible edges of the crate: parsing, config files, engine
/// processes and saved records. The session core itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid move `{uci}` in position {fen}")]
    InvalidMove { uci: String, fen: String },

    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("engine: {0}")]
    Engine(String),

    #[error("replaying record failed at ply {ply}: {source}")]
    Replay { ply: usize, source: Box<Error> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
