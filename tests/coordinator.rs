use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use boardlens::board::cozy::{parse_uci_move, Position};
use boardlens::board::Rules;
use boardlens::opponent::{Opponent, ReplyWorker};
use boardlens::session::{EngineMoveCoordinator, HistoryController, Mode, ReplyOutcome, SessionGate};
use cozy_chess::{Board, Color, Move};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

/// Answers with a fixed list of UCI moves, then with nothing.
struct Scripted {
    replies: Vec<&'static str>,
}

impl Opponent for Scripted {
    fn name(&self) -> &str { "scripted" }
    fn best_move(&mut self, board: &Board, _budget: Duration) -> Option<Move> {
        if self.replies.is_empty() { return None; }
        parse_uci_move(board, self.replies.remove(0))
    }
}

/// Holds its reply until the test releases it.
struct Held {
    release: Receiver<()>,
}

impl Opponent for Held {
    fn name(&self) -> &str { "held" }
    fn best_move(&mut self, board: &Board, _budget: Duration) -> Option<Move> {
        self.release.recv().ok()?;
        let mut found = None;
        board.generate_moves(|ml| { found = ml.into_iter().next(); found.is_some() });
        found
    }
}

struct Table {
    pos: Position,
    history: HistoryController,
    gate: SessionGate,
    coordinator: EngineMoveCoordinator,
}

impl Table {
    fn new(opponent: Box<dyn Opponent>) -> Self {
        let worker = ReplyWorker::spawn(opponent).expect("worker thread");
        Self {
            pos: Position::startpos(),
            history: HistoryController::new(),
            gate: SessionGate::new(Mode::Pve, Color::Black),
            coordinator: EngineMoveCoordinator::new(Some(worker), Duration::from_millis(10)),
        }
    }

    fn human(&mut self, uci: &str) {
        let mv = self.pos.parse_uci(uci).expect("legal human move");
        self.history.apply_move(&mut self.pos, mv);
        self.coordinator.on_human_move(&mut self.gate);
    }

    fn request(&mut self) -> bool {
        self.coordinator.request_reply(&mut self.gate, &self.history, &self.pos)
    }

    fn wait(&mut self) -> Option<ReplyOutcome> {
        self.coordinator.wait_reply(WAIT, &mut self.gate, &mut self.history, &mut self.pos)
    }
}

#[test]
fn reply_is_applied_and_undo_returns_to_human() {
    let mut t = Table::new(Box::new(Scripted { replies: vec!["e7e5"] }));
    assert!(!t.request(), "white to move is the human's turn");
    t.human("e2e4");
    assert!(t.request());
    assert!(t.gate.reply_in_flight);
    let mv = t.pos.parse_uci("e7e5").unwrap();
    assert_eq!(t.wait(), Some(ReplyOutcome::Applied(mv)));
    assert!(!t.gate.reply_in_flight);
    assert_eq!(t.history.san_history(), vec![Some("e4"), Some("e5")]);

    assert_eq!(t.history.undo_to_human_turn(&mut t.pos, &mut t.gate), 2);
    assert!(t.history.is_empty());
    assert!(!t.gate.allow_automated_reply);
    assert!(!t.request());

    t.human("d2d4");
    assert!(t.gate.allow_automated_reply);
    assert!(t.request());
    // Script exhausted: the flag clears and nothing is recorded
    assert_eq!(t.wait(), Some(ReplyOutcome::NoMove));
    assert!(!t.gate.reply_in_flight);
    assert_eq!(t.history.len(), 1);
}

#[test]
fn second_request_while_in_flight_is_rejected() {
    let (tx, rx) = mpsc::channel();
    let mut t = Table::new(Box::new(Held { release: rx }));
    t.human("e2e4");
    assert!(t.request());
    let before = t.gate.clone();
    assert!(!t.request());
    assert_eq!(t.gate, before);
    assert_eq!(t.coordinator.poll_reply(&mut t.gate, &mut t.history, &mut t.pos), None);
    tx.send(()).unwrap();
    assert!(matches!(t.wait(), Some(ReplyOutcome::Applied(_))));
    assert_eq!(t.history.len(), 2);
}

#[test]
fn reply_for_an_outdated_position_is_discarded() {
    let (tx, rx): (Sender<()>, Receiver<()>) = mpsc::channel();
    let mut t = Table::new(Box::new(Held { release: rx }));
    t.human("e2e4");
    assert!(t.request());
    // Human takes the move back while the opponent is thinking
    t.history.undo_to_human_turn(&mut t.pos, &mut t.gate);
    tx.send(()).unwrap();
    assert!(matches!(t.wait(), Some(ReplyOutcome::Stale(_))));
    assert!(!t.gate.reply_in_flight);
    assert!(t.history.is_empty());
    assert_eq!(t.pos.side_to_move(), Color::White);
}

#[test]
fn disable_then_enable_restores_gate_without_touching_history() {
    let mut t = Table::new(Box::new(Scripted { replies: vec![] }));
    t.human("e2e4");
    t.history.undo(&mut t.pos);
    let played = t.history.played().to_vec();
    let undone = t.history.undone().to_vec();

    t.coordinator.disable_engine(&mut t.gate);
    assert_eq!(t.gate.mode, Mode::Pvp);
    assert!(!t.gate.engine_enabled);
    assert!(!t.gate.allow_automated_reply);

    t.coordinator.enable_engine(&mut t.gate);
    assert_eq!(t.gate.mode, t.gate.original_mode);
    assert_eq!(t.gate.mode, Mode::Pve);
    assert!(t.gate.engine_enabled);
    assert!(t.gate.allow_automated_reply);
    assert_eq!(t.history.played(), &played[..]);
    assert_eq!(t.history.undone(), &undone[..]);
}

#[test]
fn disabled_engine_blocks_requests() {
    let mut t = Table::new(Box::new(Scripted { replies: vec!["e7e5"] }));
    t.human("e2e4");
    t.coordinator.disable_engine(&mut t.gate);
    assert!(!t.request());
    assert!(!t.gate.reply_in_flight);
}

#[test]
fn no_request_once_the_game_is_over() {
    let mut t = Table::new(Box::new(Scripted { replies: vec![] }));
    // Fool's mate with the human playing black
    t.gate = SessionGate::new(Mode::Pve, Color::White);
    for uci in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        let mv = t.pos.parse_uci(uci).unwrap();
        t.history.apply_move(&mut t.pos, mv);
    }
    assert!(t.gate.is_automated_turn(Color::White));
    assert!(!t.request());
}

#[test]
fn degraded_gate_never_requests() {
    let mut gate = SessionGate::new(Mode::Pve, Color::Black);
    gate.degrade_to_pvp();
    assert_eq!(gate.original_mode, Mode::Pvp);
    let mut coordinator = EngineMoveCoordinator::disabled();
    coordinator.enable_engine(&mut gate);
    assert_eq!(gate.mode, Mode::Pvp);
    let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
    assert!(!coordinator.request_reply(&mut gate, &HistoryController::new(), &pos));
    assert!(!gate.reply_in_flight);
}
