use std::time::{Duration, Instant};

use cozy_chess::{Board, Color, GameStatus, Move, Piece};

use crate::opponent::Opponent;

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;

pub const MATE_SCORE: i32 = 30_000;
pub const DRAW_SCORE: i32 = 0;

fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => 0,
    }
}

// Side-agnostic material in centipawns: positive means White has more material.
pub fn material_eval_cp_side_agnostic(board: &Board) -> i32 {
    Piece::ALL.iter().map(|&p| {
        let w = board.colored_pieces(Color::White, p).len() as i32;
        let b = board.colored_pieces(Color::Black, p).len() as i32;
        (w - b) * piece_value(p)
    }).sum()
}

// Material from side-to-move perspective (negamax-friendly)
pub fn material_eval_cp(board: &Board) -> i32 {
    let base = material_eval_cp_side_agnostic(board);
    if board.side_to_move() == Color::White { base } else { -base }
}

/// Built-in opponent: iterative-deepening material negamax with a deadline.
pub struct SearchOpponent {
    max_depth: u32,
    deadline: Option<Instant>,
    nodes: u64,
    aborted: bool,
}

impl SearchOpponent {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth: max_depth.max(1), deadline: None, nodes: 0, aborted: false }
    }

    pub fn nodes(&self) -> u64 { self.nodes }

    fn ordered_moves(board: &Board) -> Vec<Move> {
        let them = board.colors(!board.side_to_move());
        let mut moves = Vec::new();
        board.generate_moves(|ml| { for m in ml { moves.push(m); } false });
        // Captures first, most valuable victim first
        moves.sort_by_key(|m| {
            if them.has(m.to) { -board.piece_on(m.to).map(piece_value).unwrap_or(0) } else { 1 }
        });
        moves
    }

    fn out_of_time(&mut self) -> bool {
        if self.nodes & 1023 == 0 {
            if let Some(d) = self.deadline { if Instant::now() >= d { self.aborted = true; } }
        }
        self.aborted
    }

    fn negamax(&mut self, board: &Board, depth: u32, ply: i32, mut alpha: i32, beta: i32) -> i32 {
        self.nodes += 1;
        match board.status() {
            GameStatus::Won => return -MATE_SCORE + ply,
            GameStatus::Drawn => return DRAW_SCORE,
            GameStatus::Ongoing => {}
        }
        if depth == 0 || self.out_of_time() { return material_eval_cp(board); }
        for m in Self::ordered_moves(board) {
            let mut child = board.clone();
            child.play(m);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha);
            if self.aborted { return alpha; }
            if score >= beta { return beta; }
            if score > alpha { alpha = score; }
        }
        alpha
    }

    fn search_root(&mut self, board: &Board, depth: u32) -> Option<(Move, i32)> {
        let mut alpha = -MATE_SCORE - 1;
        let mut best = None;
        for m in Self::ordered_moves(board) {
            let mut child = board.clone();
            child.play(m);
            let score = -self.negamax(&child, depth - 1, 1, -MATE_SCORE - 1, -alpha);
            if self.aborted { return None; }
            if score > alpha { alpha = score; best = Some((m, score)); }
        }
        best
    }

    /// Deepest completed iteration's best move, searching at least depth 1.
    pub fn search(&mut self, board: &Board, budget: Option<Duration>) -> Option<Move> {
        self.nodes = 0;
        self.aborted = false;
        self.deadline = None;
        let mut best = self.search_root(board, 1).map(|(m, _)| m);
        self.deadline = budget.map(|b| Instant::now() + b);
        for depth in 2..=self.max_depth {
            match self.search_root(board, depth) {
                Some((m, score)) => {
                    best = Some(m);
                    if score.abs() >= MATE_SCORE - 256 { break; }
                }
                None => break,
            }
        }
        best
    }
}

impl Opponent for SearchOpponent {
    fn name(&self) -> &str { "material-search" }

    fn best_move(&mut self, board: &Board, budget: Duration) -> Option<Move> {
        self.search(board, Some(budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_material_startpos_is_zero() {
        assert_eq!(material_eval_cp(&Board::default()), 0);
    }

    #[test]
    fn search_prefers_winning_queen_capture() {
        // Qe2xd2 wins a queen
        let b = Board::from_fen("k7/8/8/8/8/8/3qQ3/7K w - - 0 1", false).unwrap();
        let mut s = SearchOpponent::new(2);
        let bm = s.search(&b, None).expect("expected a best move");
        assert_eq!(format!("{}", bm), "e2d2");
        assert!(s.nodes() > 0);
    }

    #[test]
    fn search_finds_back_rank_mate() {
        let b = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", false).unwrap();
        let mut s = SearchOpponent::new(3);
        let bm = s.search(&b, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(format!("{}", bm), "a1a8");
    }

    #[test]
    fn no_move_when_game_is_over() {
        let b = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1", false).unwrap();
        assert!(SearchOpponent::new(2).search(&b, None).is_none());
    }
}
