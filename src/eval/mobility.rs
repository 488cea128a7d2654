use cozy_chess::{BitBoard, File, Rank, Square};

use crate::board::Rules;

const SLIDES: [(i8, i8); 8] = [(0, 1), (0, -1), (1, 0), (-1, 0), (1, 1), (1, -1), (-1, 1), (-1, -1)];
const JUMPS: [(i8, i8); 8] = [(2, 1), (2, -1), (-2, 1), (-2, -1), (1, 2), (1, -2), (-1, 2), (-1, -2)];

fn offset(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let f = sq.file() as i8 + df;
    let r = sq.rank() as i8 + dr;
    if !(0..8).contains(&f) || !(0..8).contains(&r) { return None; }
    Some(Square::new(File::index(f as usize), Rank::index(r as usize)))
}

/// Moves a queen+knight hybrid would have on `sq`, counting only empty
/// destinations. Piece color plays no part.
pub fn square_mobility(occupied: BitBoard, sq: Square) -> u8 {
    let mut count = 0u8;
    for (df, dr) in SLIDES {
        let mut cur = sq;
        while let Some(next) = offset(cur, df, dr) {
            if occupied.has(next) { break; }
            count += 1;
            cur = next;
        }
    }
    for (df, dr) in JUMPS {
        if let Some(to) = offset(sq, df, dr) {
            if !occupied.has(to) { count += 1; }
        }
    }
    count
}

/// Per-square mobility for the whole board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobilityMap([u8; 64]);

impl MobilityMap {
    pub fn evaluate<R: Rules + ?Sized>(rules: &R) -> Self { Self::from_occupancy(rules.occupied()) }

    pub fn from_occupancy(occupied: BitBoard) -> Self {
        let mut counts = [0u8; 64];
        for sq in Square::ALL { counts[sq as usize] = square_mobility(occupied, sq); }
        Self(counts)
    }

    pub fn get(&self, sq: Square) -> u8 { self.0[sq as usize] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blockers_stop_the_ray_and_are_not_counted() {
        // a1 with a blocker on a3 and b1: up ray gets a2 only, right ray nothing
        let occ = Square::A3.bitboard() | Square::B1.bitboard();
        // a2 + diagonal 7 + knight b3, c2
        assert_eq!(square_mobility(occ, Square::A1), 1 + 7 + 2);
    }

    #[test]
    fn occupied_knight_targets_do_not_count() {
        let occ = Square::B3.bitboard();
        // sliding 21, knight only c2
        assert_eq!(square_mobility(occ, Square::A1), 21 + 1);
    }
}
