use std::time::Duration;

use cozy_chess::{Board, Move};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::opponent::Opponent;

/// Plays a uniformly random legal move. Seeded, so games are reproducible.
pub struct RandomOpponent {
    rng: SmallRng,
}

impl RandomOpponent {
    pub fn new(seed: u64) -> Self { Self { rng: SmallRng::seed_from_u64(seed) } }
}

impl Opponent for RandomOpponent {
    fn name(&self) -> &str { "random" }

    fn best_move(&mut self, board: &Board, _budget: Duration) -> Option<Move> {
        let mut moves: Vec<Move> = Vec::new();
        board.generate_moves(|ml| { for m in ml { moves.push(m); } false });
        if moves.is_empty() { None } else { Some(moves[self.rng.gen_range(0..moves.len())]) }
    }
}
