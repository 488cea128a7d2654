use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::opponent::random::RandomOpponent;
use crate::opponent::search::SearchOpponent;
use crate::opponent::uci::UciOpponent;
use crate::opponent::Opponent;
use crate::session::gate::{Mode, Side};

/// Which automated opponent to start for a PvE session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OpponentConfig {
    /// External UCI engine process.
    Uci {
        path: String,
        #[serde(default)]
        options: BTreeMap<String, String>,
    },
    /// Built-in material search.
    Search { depth: u32 },
    /// Seeded random mover.
    Random { seed: u64 },
}

impl Default for OpponentConfig {
    fn default() -> Self {
        let mut options = BTreeMap::new();
        options.insert("Skill Level".to_string(), "3".to_string());
        OpponentConfig::Uci { path: "stockfish".to_string(), options }
    }
}

impl OpponentConfig {
    pub fn build(&self) -> Result<Box<dyn Opponent>> {
        Ok(match self {
            OpponentConfig::Uci { path, options } => Box::new(UciOpponent::spawn(path, options)?),
            OpponentConfig::Search { depth } => Box::new(SearchOpponent::new(*depth)),
            OpponentConfig::Random { seed } => Box::new(RandomOpponent::new(*seed)),
        })
    }
}

/// Session settings; every field has a default so config files can be partial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: Mode,
    pub automated_side: Side,
    pub opponent: OpponentConfig,
    pub think_time_ms: u64,
    /// Starting position; the standard start when absent.
    pub fen: Option<String>,
    pub show_control: bool,
    pub show_weakness: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Pvp,
            automated_side: Side::Black,
            opponent: OpponentConfig::default(),
            think_time_ms: 500,
            fen: None,
            show_control: true,
            show_weakness: true,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config { path: path.to_path_buf(), message: e.to_string() })?;
        serde_json::from_str(&text).map_err(|e| Error::Config { path: path.to_path_buf(), message: e.to_string() })
    }

    pub fn think_time(&self) -> Duration { Duration::from_millis(self.think_time_ms) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = SessionConfig::from_json_str(r#"{ "mode": "pve", "automated_side": "white" }"#).unwrap();
        assert_eq!(c.mode, Mode::Pve);
        assert_eq!(c.automated_side, Side::White);
        assert_eq!(c.think_time_ms, 500);
        assert_eq!(c.opponent, OpponentConfig::default());
        assert!(c.show_control && c.show_weakness);
    }

    #[test]
    fn opponent_kinds_parse() {
        let c = SessionConfig::from_json_str(r#"{ "opponent": { "kind": "search", "depth": 3 } }"#).unwrap();
        assert_eq!(c.opponent, OpponentConfig::Search { depth: 3 });
        let c = SessionConfig::from_json_str(r#"{ "opponent": { "kind": "uci", "path": "/usr/bin/sf" } }"#).unwrap();
        assert_eq!(c.opponent, OpponentConfig::Uci { path: "/usr/bin/sf".into(), options: BTreeMap::new() });
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = SessionConfig::load(Path::new("/nonexistent/boardlens.json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
