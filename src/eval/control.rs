use cozy_chess::{BitBoard, Color, Piece, Square};

use crate::board::Rules;

/// Lower bound of the display intensity scale.
pub const MIN_INTENSITY: u8 = 120;
/// Upper bound of the display intensity scale.
pub const MAX_INTENSITY: u8 = 255;

const SINGLE_SIDE_SCALE: f64 = 28.0;
const CONTESTED_SCALE: f64 = 14.0;

/// Attack weight of one attacker. Kings weigh infinitely.
pub fn attack_weight(piece: Piece) -> f64 {
    match piece {
        Piece::Queen => 9.0,
        Piece::Rook => 5.0,
        Piece::Bishop => 3.5,
        Piece::Knight => 3.0,
        Piece::Pawn => 1.0,
        Piece::King => f64::INFINITY,
    }
}

/// Defense weight of one attacker: `10 - attack_weight`, with the king fixed at 0.1.
pub fn defense_weight(piece: Piece) -> f64 {
    match piece {
        Piece::King => 0.1,
        p => 10.0 - attack_weight(p),
    }
}

/// Aggregated attack/defense both colors exert on one square.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlValue {
    pub white_attack: f64,
    pub white_defense: f64,
    pub black_attack: f64,
    pub black_defense: f64,
}

impl ControlValue {
    pub fn attack(&self, color: Color) -> f64 {
        match color { Color::White => self.white_attack, Color::Black => self.black_attack }
    }

    pub fn defense(&self, color: Color) -> f64 {
        match color { Color::White => self.white_defense, Color::Black => self.black_defense }
    }

    pub fn has_attackers(&self, color: Color) -> bool { self.attack(color) > 0.0 }

    fn add_attacker(&mut self, color: Color, piece: Piece) {
        let (attack, defense) = match color {
            Color::White => (&mut self.white_attack, &mut self.white_defense),
            Color::Black => (&mut self.black_attack, &mut self.black_defense),
        };
        *attack += attack_weight(piece);
        *defense += defense_weight(piece);
    }

    pub fn classify(&self) -> Classification {
        match (self.has_attackers(Color::White), self.has_attackers(Color::Black)) {
            (false, false) => Classification::Neutral,
            (true, false) => Classification::Controlled { by: Color::White, intensity: single_side_intensity(self.white_defense) },
            (false, true) => Classification::Controlled { by: Color::Black, intensity: single_side_intensity(self.black_defense) },
            (true, true) => {
                let diff = self.white_defense - self.black_defense;
                if diff > 0.0 {
                    Classification::Controlled { by: Color::White, intensity: contested_intensity(diff) }
                } else if diff < 0.0 {
                    Classification::Controlled { by: Color::Black, intensity: contested_intensity(-diff) }
                } else {
                    Classification::Tie
                }
            }
        }
    }

    /// Both colors attack the square.
    pub fn is_contested(&self) -> bool {
        self.has_attackers(Color::White) && self.has_attackers(Color::Black)
    }
}

fn single_side_intensity(defense: f64) -> u8 {
    ((defense * SINGLE_SIDE_SCALE) as i64).clamp(MIN_INTENSITY as i64, MAX_INTENSITY as i64) as u8
}

fn contested_intensity(diff: f64) -> u8 {
    let span = (MAX_INTENSITY - MIN_INTENSITY) as i64;
    MIN_INTENSITY + ((diff * CONTESTED_SCALE) as i64).min(span) as u8
}

/// How the host should paint a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Nobody attacks the square.
    Neutral,
    /// One color owns the square, alone or by out-defending the other.
    Controlled { by: Color, intensity: u8 },
    /// Both colors attack with equal total defense.
    Tie,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquareControl {
    pub value: ControlValue,
    pub classification: Classification,
    /// Drawn with the contested marker whatever the classification.
    pub contested: bool,
}

impl Default for SquareControl {
    fn default() -> Self {
        Self { value: ControlValue::default(), classification: Classification::Neutral, contested: false }
    }
}

/// Control for all 64 squares.
#[derive(Clone, Debug)]
pub struct ControlMap {
    squares: [SquareControl; 64],
}

impl ControlMap {
    pub fn evaluate<R: Rules + ?Sized>(rules: &R) -> Self {
        let mut squares = [SquareControl::default(); 64];
        for sq in Square::ALL {
            let value = control_value(rules, sq);
            squares[sq as usize] = SquareControl { value, classification: value.classify(), contested: value.is_contested() };
        }
        Self { squares }
    }

    pub fn get(&self, sq: Square) -> &SquareControl { &self.squares[sq as usize] }

    pub fn iter(&self) -> impl Iterator<Item = (Square, &SquareControl)> + '_ {
        Square::ALL.into_iter().zip(self.squares.iter())
    }

    pub fn contested(&self) -> BitBoard {
        self.iter().filter(|(_, c)| c.contested).fold(BitBoard::EMPTY, |bb, (sq, _)| bb | sq.bitboard())
    }
}

/// Sums the weights of every attacker of `sq`, per color.
pub fn control_value<R: Rules + ?Sized>(rules: &R, sq: Square) -> ControlValue {
    let mut value = ControlValue::default();
    for color in Color::ALL {
        for from in rules.attackers(color, sq) {
            if let Some((_, piece)) = rules.piece_at(from) {
                value.add_attacker(color, piece);
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(wa: f64, wd: f64, ba: f64, bd: f64) -> ControlValue {
        ControlValue { white_attack: wa, white_defense: wd, black_attack: ba, black_defense: bd }
    }

    #[test]
    fn defense_weights_complement_attack() {
        assert_eq!(defense_weight(Piece::Queen), 1.0);
        assert_eq!(defense_weight(Piece::Bishop), 6.5);
        assert_eq!(defense_weight(Piece::Pawn), 9.0);
        assert_eq!(defense_weight(Piece::King), 0.1);
        assert!(attack_weight(Piece::King).is_infinite());
    }

    #[test]
    fn single_side_intensity_is_clamped() {
        // A lone queen: defense 1 -> 28, clamped up to 120
        assert_eq!(value(9.0, 1.0, 0.0, 0.0).classify(), Classification::Controlled { by: Color::White, intensity: 120 });
        // Pawn + knight: defense 16 -> 448, clamped down to 255
        assert_eq!(value(0.0, 0.0, 4.0, 16.0).classify(), Classification::Controlled { by: Color::Black, intensity: 255 });
        // Pawn alone: defense 9 -> 252
        assert_eq!(value(1.0, 9.0, 0.0, 0.0).classify(), Classification::Controlled { by: Color::White, intensity: 252 });
    }

    #[test]
    fn contested_compares_total_defense() {
        // White pawn (9) vs black knight (7): diff 2 -> 120 + 28
        let v = value(1.0, 9.0, 3.0, 7.0);
        assert!(v.is_contested());
        assert_eq!(v.classify(), Classification::Controlled { by: Color::White, intensity: 148 });
        // Large gap saturates at 255
        let v = value(3.0, 27.0, 9.0, 1.0);
        assert_eq!(v.classify(), Classification::Controlled { by: Color::White, intensity: 255 });
        // Equal defense is a tie
        let v = value(5.0, 5.0, 5.0, 5.0);
        assert_eq!(v.classify(), Classification::Tie);
        assert!(v.is_contested());
    }

    #[test]
    fn king_only_square_uses_minimum_intensity() {
        let v = value(f64::INFINITY, 0.1, 0.0, 0.0);
        assert_eq!(v.classify(), Classification::Controlled { by: Color::White, intensity: MIN_INTENSITY });
    }
}
