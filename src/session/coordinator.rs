use std::time::Duration;

use cozy_chess::Move;
use log::{debug, info, warn};

use crate::board::Rules;
use crate::opponent::{ReplyPoll, ReplyWorker};
use crate::session::gate::{Mode, SessionGate};
use crate::session::history::HistoryController;

/// What happened to an automated reply once it came back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The move was recorded in the history.
    Applied(Move),
    /// The opponent had nothing to play.
    NoMove,
    /// History changed while the opponent was thinking; the move was dropped.
    Stale(Move),
    /// The opponent answered with a move the rules reject.
    Rejected(Move),
    /// The worker thread died.
    Lost,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    revision: u64,
}

/// Decides when the automated opponent may move and feeds its replies into
/// the history.
pub struct EngineMoveCoordinator {
    worker: Option<ReplyWorker>,
    budget: Duration,
    pending: Option<Pending>,
}

impl EngineMoveCoordinator {
    pub fn new(worker: Option<ReplyWorker>, budget: Duration) -> Self {
        Self { worker, budget, pending: None }
    }

    /// A coordinator for sessions without an opponent.
    pub fn disabled() -> Self { Self::new(None, Duration::ZERO) }

    pub fn opponent_name(&self) -> Option<&str> { self.worker.as_ref().map(|w| w.name()) }

    pub fn budget(&self) -> Duration { self.budget }

    /// A human move re-arms automated replies.
    pub fn on_human_move(&self, gate: &mut SessionGate) { gate.allow_automated_reply = true; }

    pub fn disable_engine(&self, gate: &mut SessionGate) {
        gate.engine_enabled = false;
        gate.mode = Mode::Pvp;
        gate.allow_automated_reply = false;
        info!("automated opponent disabled");
    }

    pub fn enable_engine(&self, gate: &mut SessionGate) {
        gate.engine_enabled = true;
        gate.mode = gate.original_mode;
        gate.allow_automated_reply = true;
        info!("automated opponent enabled, mode {:?}", gate.mode);
    }

    pub fn can_request<R: Rules + ?Sized>(&self, gate: &SessionGate, rules: &R) -> bool {
        gate.is_automated_turn(rules.side_to_move())
            && !rules.is_game_over()
            && gate.allow_automated_reply
            && gate.engine_enabled
            && !gate.reply_in_flight
    }

    /// Hands the current position to the opponent. Returns false, changing
    /// nothing, when the gate does not allow a request right now.
    pub fn request_reply<R: Rules + ?Sized>(&mut self, gate: &mut SessionGate, history: &HistoryController, rules: &R) -> bool {
        if !self.can_request(gate, rules) { return false; }
        let Some(worker) = &self.worker else { return false };
        if !worker.submit(rules.board().clone(), self.budget) {
            warn!("opponent worker {} is gone", worker.name());
            return false;
        }
        gate.reply_in_flight = true;
        self.pending = Some(Pending { revision: history.revision() });
        debug!("reply requested at ply {}", history.len());
        true
    }

    /// Non-blocking check for the in-flight reply.
    pub fn poll_reply<R: Rules + ?Sized>(&mut self, gate: &mut SessionGate, history: &mut HistoryController, rules: &mut R) -> Option<ReplyOutcome> {
        if self.pending.is_none() { return None; }
        let poll = self.worker.as_ref()?.try_reply();
        self.settle(poll, gate, history, rules)
    }

    /// Like [`poll_reply`](Self::poll_reply) but waits up to `timeout`.
    pub fn wait_reply<R: Rules + ?Sized>(&mut self, timeout: Duration, gate: &mut SessionGate, history: &mut HistoryController, rules: &mut R) -> Option<ReplyOutcome> {
        if self.pending.is_none() { return None; }
        let poll = self.worker.as_ref()?.wait_reply(timeout);
        self.settle(poll, gate, history, rules)
    }

    fn settle<R: Rules + ?Sized>(&mut self, poll: ReplyPoll, gate: &mut SessionGate, history: &mut HistoryController, rules: &mut R) -> Option<ReplyOutcome> {
        let pending = self.pending?;
        let outcome = match poll {
            ReplyPoll::Pending => return None,
            ReplyPoll::Disconnected => {
                warn!("opponent worker disconnected with a reply in flight");
                self.worker = None;
                gate.degrade_to_pvp();
                ReplyOutcome::Lost
            }
            ReplyPoll::Ready(None) => ReplyOutcome::NoMove,
            ReplyPoll::Ready(Some(mv)) if pending.revision != history.revision() => {
                debug!("dropping stale reply {}", mv);
                ReplyOutcome::Stale(mv)
            }
            ReplyPoll::Ready(Some(mv)) if !rules.is_legal(mv) => {
                warn!("opponent replied with illegal move {}", mv);
                ReplyOutcome::Rejected(mv)
            }
            ReplyPoll::Ready(Some(mv)) => {
                history.apply_move(rules, mv);
                info!("automated reply {}", history.last_notation().unwrap_or("?"));
                ReplyOutcome::Applied(mv)
            }
        };
        self.pending = None;
        gate.reply_in_flight = false;
        Some(outcome)
    }
}
