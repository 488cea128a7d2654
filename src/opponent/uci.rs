use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use cozy_chess::{Board, Move};
use log::{debug, info, warn};

use crate::board::cozy::parse_uci_move;
use crate::error::{Error, Result};
use crate::opponent::Opponent;

/// An external engine spoken to over the UCI protocol.
///
/// The process starts in [`UciOpponent::spawn`] and is told to quit when the
/// opponent is dropped.
pub struct UciOpponent {
    name: String,
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
}

impl UciOpponent {
    pub fn spawn(path: &str, options: &BTreeMap<String, String>) -> Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to start `{}`: {}", path, e)))?;
        let stdin = child.stdin.take().ok_or_else(|| Error::Engine("engine stdin unavailable".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| Error::Engine("engine stdout unavailable".into()))?;
        let mut engine = Self { name: path.to_string(), child, stdin, reader: BufReader::new(stdout) };

        engine.send("uci")?;
        let id = engine.wait_for("uciok")?;
        if let Some(n) = id { engine.name = n; }
        for (name, value) in options {
            engine.send(&format!("setoption name {} value {}", name, value))?;
        }
        engine.send("isready")?;
        engine.wait_for("readyok")?;
        info!("UCI engine ready: {}", engine.name);
        Ok(engine)
    }

    fn send(&mut self, cmd: &str) -> Result<()> {
        debug!("uci > {}", cmd);
        writeln!(self.stdin, "{}", cmd)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(Error::Engine(format!("{} closed its output", self.name)));
        }
        Ok(line.trim().to_string())
    }

    /// Reads until a line starting with `target`, returning any `id name` seen.
    fn wait_for(&mut self, target: &str) -> Result<Option<String>> {
        let mut id = None;
        loop {
            let line = self.read_line()?;
            if let Some(n) = line.strip_prefix("id name ") { id = Some(n.to_string()); }
            if line.starts_with(target) { return Ok(id); }
        }
    }

    fn search(&mut self, board: &Board, budget: Duration) -> Result<Option<Move>> {
        self.send("isready")?;
        self.wait_for("readyok")?;
        self.send(&format!("position fen {}", board))?;
        self.send(&format!("go movetime {}", budget.as_millis().max(1)))?;
        loop {
            let line = self.read_line()?;
            if let Some(rest) = line.strip_prefix("bestmove") {
                let token = rest.split_whitespace().next().unwrap_or("(none)");
                if token == "(none)" || token == "0000" { return Ok(None); }
                return match parse_uci_move(board, token) {
                    Some(mv) => Ok(Some(mv)),
                    None => Err(Error::InvalidMove { uci: token.to_string(), fen: format!("{}", board) }),
                };
            }
        }
    }
}

impl Opponent for UciOpponent {
    fn name(&self) -> &str { &self.name }

    fn best_move(&mut self, board: &Board, budget: Duration) -> Option<Move> {
        match self.search(board, budget) {
            Ok(mv) => mv,
            Err(e) => {
                warn!("{}: {}", self.name, e);
                None
            }
        }
    }
}

impl Drop for UciOpponent {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "quit");
        let _ = self.stdin.flush();
        match self.child.try_wait() {
            Ok(Some(_)) => {}
            _ => {
                std::thread::sleep(Duration::from_millis(50));
                if let Ok(None) = self.child.try_wait() { let _ = self.child.kill(); }
                let _ = self.child.wait();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_an_engine_error() {
        let err = UciOpponent::spawn("/nonexistent/boardlens-engine", &BTreeMap::new()).err().expect("spawn must fail");
        assert!(matches!(err, Error::Engine(_)), "got {:?}", err);
    }
}
