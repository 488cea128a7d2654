use cozy_chess::{BitBoard, Color, Square};

use crate::board::Rules;

/// Squares no friendly pawn on an adjacent file can ever defend, per color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeakSquares {
    white: BitBoard,
    black: BitBoard,
}

impl WeakSquares {
    pub fn evaluate<R: Rules + ?Sized>(rules: &R) -> Self {
        Self::from_pawns(rules.pawns(Color::White), rules.pawns(Color::Black))
    }

    pub fn from_pawns(white_pawns: BitBoard, black_pawns: BitBoard) -> Self {
        let mut white = BitBoard::EMPTY;
        let mut black = BitBoard::EMPTY;
        for sq in Square::ALL {
            if is_weak(Color::White, sq, white_pawns) { white |= sq.bitboard(); }
            if is_weak(Color::Black, sq, black_pawns) { black |= sq.bitboard(); }
        }
        Self { white, black }
    }

    pub fn for_color(&self, color: Color) -> BitBoard {
        match color { Color::White => self.white, Color::Black => self.black }
    }

    pub fn is_weak(&self, color: Color, sq: Square) -> bool { self.for_color(color).has(sq) }
}

/// True when no pawn in `pawns` sits on file±1 strictly behind `sq`, where
/// behind is a lower rank for white and a higher rank for black.
pub fn is_weak(color: Color, sq: Square, pawns: BitBoard) -> bool {
    let file = sq.file() as i32;
    let rank = sq.rank() as i32;
    !pawns.into_iter().any(|p| {
        let pf = p.file() as i32;
        let pr = p.rank() as i32;
        let behind = match color { Color::White => pr < rank, Color::Black => pr > rank };
        (pf - file).abs() == 1 && behind
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pawns_means_everything_is_weak() {
        let w = WeakSquares::from_pawns(BitBoard::EMPTY, BitBoard::EMPTY);
        assert_eq!(w.for_color(Color::White).len(), 64);
        assert_eq!(w.for_color(Color::Black).len(), 64);
    }

    #[test]
    fn edge_file_pawn_covers_only_one_neighbour() {
        let pawns = Square::A2.bitboard();
        assert!(!is_weak(Color::White, Square::B3, pawns));
        assert!(!is_weak(Color::White, Square::B8, pawns));
        // Same file and rank-equal squares are not covered
        assert!(is_weak(Color::White, Square::A3, pawns));
        assert!(is_weak(Color::White, Square::B2, pawns));
        assert!(is_weak(Color::White, Square::C3, pawns));
    }

    #[test]
    fn black_looks_towards_higher_ranks() {
        let pawns = Square::D7.bitboard();
        assert!(!is_weak(Color::Black, Square::E5, pawns));
        assert!(!is_weak(Color::Black, Square::C1, pawns));
        assert!(is_weak(Color::Black, Square::E8, pawns));
        assert!(is_weak(Color::Black, Square::E7, pawns));
    }
}
