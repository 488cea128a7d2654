//! Automated opponents and the worker thread that keeps their thinking off
//! the control loop.

pub mod random;
pub mod search;
pub mod uci;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cozy_chess::{Board, Move};
use log::{debug, warn};

use crate::error::Result;

/// Something that picks a move for the side to move.
pub trait Opponent: Send {
    fn name(&self) -> &str;

    /// Best move within roughly `budget`, or `None` when there is nothing to
    /// play or the opponent failed.
    fn best_move(&mut self, board: &Board, budget: Duration) -> Option<Move>;
}

struct Job {
    board: Board,
    budget: Duration,
}

/// Result of checking on a submitted job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyPoll {
    Ready(Option<Move>),
    Pending,
    /// The worker thread is gone; no reply will ever arrive.
    Disconnected,
}

/// Runs an [`Opponent`] on its own thread. Jobs go in over one channel and
/// replies come back over another, in order.
pub struct ReplyWorker {
    name: String,
    jobs: Option<Sender<Job>>,
    replies: Receiver<Option<Move>>,
    handle: Option<JoinHandle<()>>,
}

impl ReplyWorker {
    pub fn spawn(mut opponent: Box<dyn Opponent>) -> Result<Self> {
        let name = opponent.name().to_string();
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (reply_tx, reply_rx) = mpsc::channel::<Option<Move>>();
        let handle = thread::Builder::new()
            .name(format!("opponent-{}", name))
            .spawn(move || {
                for job in job_rx {
                    let mv = opponent.best_move(&job.board, job.budget);
                    if reply_tx.send(mv).is_err() { break; }
                }
            })?;
        debug!("opponent worker started: {}", name);
        Ok(Self { name, jobs: Some(job_tx), replies: reply_rx, handle: Some(handle) })
    }

    pub fn name(&self) -> &str { &self.name }

    /// Queues a search. Returns false when the worker has died.
    pub fn submit(&self, board: Board, budget: Duration) -> bool {
        match &self.jobs {
            Some(tx) => tx.send(Job { board, budget }).is_ok(),
            None => false,
        }
    }

    pub fn try_reply(&self) -> ReplyPoll {
        match self.replies.try_recv() {
            Ok(mv) => ReplyPoll::Ready(mv),
            Err(TryRecvError::Empty) => ReplyPoll::Pending,
            Err(TryRecvError::Disconnected) => ReplyPoll::Disconnected,
        }
    }

    pub fn wait_reply(&self, timeout: Duration) -> ReplyPoll {
        match self.replies.recv_timeout(timeout) {
            Ok(mv) => ReplyPoll::Ready(mv),
            Err(RecvTimeoutError::Timeout) => ReplyPoll::Pending,
            Err(RecvTimeoutError::Disconnected) => ReplyPoll::Disconnected,
        }
    }
}

impl Drop for ReplyWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop once the current search returns.
        self.jobs.take();
        if let Some(h) = self.handle.take() {
            if h.join().is_err() { warn!("opponent worker {} panicked", self.name); }
        }
    }
}
