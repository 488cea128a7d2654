pub mod cozy;

use cozy_chess::{BitBoard, Board, Color, Move, Piece, Square};

/// Rules collaborator consumed by the evaluators and the session core.
///
/// Legality, check detection and notation live behind this trait; the core
/// never second-guesses them.
pub trait Rules {
    /// Squares holding pieces of `color` that attack `square`.
    fn attackers(&self, color: Color, square: Square) -> BitBoard;
    fn piece_at(&self, square: Square) -> Option<(Color, Piece)>;
    fn side_to_move(&self) -> Color;
    fn is_legal(&self, mv: Move) -> bool;
    /// Plays a legal move. Panics on an illegal one.
    fn apply(&mut self, mv: Move);
    /// Takes back exactly one ply, returning the move that was undone.
    fn revert(&mut self) -> Option<Move>;
    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;
    /// SAN for `mv` in the current (pre-move) position.
    fn to_algebraic(&self, mv: Move) -> Option<String>;

    /// Snapshot handed to the automated opponent.
    fn board(&self) -> &Board;

    fn is_game_over(&self) -> bool { self.is_checkmate() || self.is_stalemate() }

    fn occupied(&self) -> BitBoard {
        let mut occ = BitBoard::EMPTY;
        for sq in Square::ALL {
            if self.piece_at(sq).is_some() { occ |= sq.bitboard(); }
        }
        occ
    }

    fn pawns(&self, color: Color) -> BitBoard {
        let mut bb = BitBoard::EMPTY;
        for sq in Square::ALL {
            if self.piece_at(sq) == Some((color, Piece::Pawn)) { bb |= sq.bitboard(); }
        }
        bb
    }
}
