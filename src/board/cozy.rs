use cozy_chess::{
    get_bishop_moves, get_king_moves, get_knight_moves, get_pawn_attacks, get_rook_moves,
    BitBoard, Board as CozyBoard, Color, File, GameStatus, Move, Piece, Square,
};

use crate::board::Rules;
use crate::error::{Error, Result};

/// cozy-chess position with a reversible move stack.
#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
    stack: Vec<(CozyBoard, Move)>,
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default(), stack: Vec::with_capacity(128) }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        CozyBoard::from_fen(fen, false)
            .map(|b| Self { board: b, stack: Vec::with_capacity(128) })
            .map_err(|e| Error::InvalidFen(format!("{fen}: {e:?}")))
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String { format!("{}", self.board) }

    /// FEN of the position before any move on the stack was played.
    pub fn root_fen(&self) -> String {
        match self.stack.first() {
            Some((b, _)) => format!("{}", b),
            None => self.fen(),
        }
    }

    pub fn plies(&self) -> usize { self.stack.len() }

    pub fn fullmove_number(&self) -> u16 { self.board.fullmove_number() }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut v = Vec::new();
        self.board.generate_moves(|ml| { for m in ml { v.push(m); } false });
        v
    }

    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        let mut v = Vec::new();
        self.board.generate_moves(|ml| {
            for m in ml { if m.from == from { v.push(m); } }
            false
        });
        v
    }

    /// Resolves a UCI string to a legal move. Accepts both `e1g1` and the
    /// king-takes-rook castling encoding.
    pub fn parse_uci(&self, uci: &str) -> Option<Move> { parse_uci_move(&self.board, uci) }

    /// Builds a legal move from its endpoints, mapping standard castling
    /// targets onto the rook square. Pawns reaching the last rank without an
    /// explicit promotion become queens.
    pub fn resolve_move(&self, from: Square, to: Square, promotion: Option<Piece>) -> Option<Move> {
        let promotion = match (self.board.piece_on(from), promotion) {
            (Some(Piece::Pawn), None) if is_last_rank(to) => Some(Piece::Queen),
            (_, p) => p,
        };
        let candidate = Move { from, to, promotion };
        if self.board.is_legal(candidate) { return Some(candidate); }
        self.legal_moves_from(from)
            .into_iter()
            .find(|&m| m.promotion == promotion && castle_target(&self.board, m) == Some(to))
    }

    /// Standard UCI text for a move in this position.
    pub fn uci(&self, mv: Move) -> String { uci_string(&self.board, mv) }

    /// King square of the side to move when it is in check.
    pub fn checked_king(&self) -> Option<Square> {
        if self.board.checkers().is_empty() { return None; }
        Some(self.board.king(self.board.side_to_move()))
    }

    fn has_legal_move(&self) -> bool {
        let mut any = false;
        self.board.generate_moves(|_| { any = true; true });
        any
    }
}

impl Rules for Position {
    fn attackers(&self, color: Color, square: Square) -> BitBoard {
        let b = &self.board;
        let occ = b.occupied();
        let diag = b.colored_pieces(color, Piece::Bishop) | b.colored_pieces(color, Piece::Queen);
        let ortho = b.colored_pieces(color, Piece::Rook) | b.colored_pieces(color, Piece::Queen);
        (get_pawn_attacks(square, !color) & b.colored_pieces(color, Piece::Pawn))
            | (get_knight_moves(square) & b.colored_pieces(color, Piece::Knight))
            | (get_king_moves(square) & b.colored_pieces(color, Piece::King))
            | (get_bishop_moves(square, occ) & diag)
            | (get_rook_moves(square, occ) & ortho)
    }

    fn piece_at(&self, square: Square) -> Option<(Color, Piece)> {
        Some((self.board.color_on(square)?, self.board.piece_on(square)?))
    }

    fn side_to_move(&self) -> Color { self.board.side_to_move() }

    fn is_legal(&self, mv: Move) -> bool { self.board.is_legal(mv) }

    fn apply(&mut self, mv: Move) {
        let before = self.board.clone();
        self.board.play(mv);
        self.stack.push((before, mv));
    }

    fn revert(&mut self) -> Option<Move> {
        let (before, mv) = self.stack.pop()?;
        self.board = before;
        Some(mv)
    }

    fn is_check(&self) -> bool { !self.board.checkers().is_empty() }

    fn is_checkmate(&self) -> bool { self.is_check() && !self.has_legal_move() }

    fn is_stalemate(&self) -> bool { !self.is_check() && !self.has_legal_move() }

    fn to_algebraic(&self, mv: Move) -> Option<String> {
        if !self.board.is_legal(mv) { return None; }
        Some(san_for_move(&self.board, mv))
    }

    fn board(&self) -> &CozyBoard { &self.board }

    fn is_game_over(&self) -> bool { self.board.status() != GameStatus::Ongoing }

    fn occupied(&self) -> BitBoard { self.board.occupied() }

    fn pawns(&self, color: Color) -> BitBoard { self.board.colored_pieces(color, Piece::Pawn) }
}

fn is_last_rank(sq: Square) -> bool {
    let r = sq.rank() as usize;
    r == 0 || r == 7
}

/// For a castling move in cozy's king-takes-rook encoding, the square the
/// king lands on.
fn castle_target(board: &CozyBoard, mv: Move) -> Option<Square> {
    if board.piece_on(mv.from) != Some(Piece::King) { return None; }
    let stm = board.side_to_move();
    if board.colored_pieces(stm, Piece::Rook).has(mv.to) {
        let file = if mv.to.file() as usize > mv.from.file() as usize { File::G } else { File::C };
        Some(Square::new(file, mv.from.rank()))
    } else {
        None
    }
}

/// Legal move of `board` written as `uci`, in either castling encoding.
pub fn parse_uci_move(board: &CozyBoard, uci: &str) -> Option<Move> {
    let uci = uci.trim();
    let mut found = None;
    board.generate_moves(|ml| {
        for m in ml {
            if format!("{}", m) == uci || uci_string(board, m) == uci { found = Some(m); break; }
        }
        found.is_some()
    });
    found
}

fn uci_string(board: &CozyBoard, mv: Move) -> String {
    match castle_target(board, mv) {
        Some(to) => format!("{}{}", mv.from, to),
        None => format!("{}", mv),
    }
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn is_capture_move(board: &CozyBoard, mv: Move) -> bool {
    let stm = board.side_to_move();
    if let Some(col) = board.color_on(mv.to) { return col != stm; }
    // En passant: diagonal pawn move onto an empty square
    board.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file()
}

/// SAN for a legal move, with minimal disambiguation and check/mate suffix.
fn san_for_move(board: &CozyBoard, mv: Move) -> String {
    let moving = board.piece_on(mv.from);
    let mut san = if castle_target(board, mv).is_some() {
        if mv.to.file() as usize > mv.from.file() as usize { "O-O".to_string() } else { "O-O-O".to_string() }
    } else {
        let capture = is_capture_move(board, mv);
        let mut s = String::new();
        match moving {
            Some(Piece::Pawn) | None => {
                if capture { s.push(char::from(b'a' + mv.from.file() as u8)); }
            }
            Some(p) => {
                s.push(piece_char(p));
                let mut others: Vec<Square> = Vec::new();
                board.generate_moves(|ml| {
                    for m in ml {
                        if m.from != mv.from && m.to == mv.to && board.piece_on(m.from) == moving && !others.contains(&m.from) {
                            others.push(m.from);
                        }
                    }
                    false
                });
                if !others.is_empty() {
                    let shares_file = others.iter().any(|o| o.file() == mv.from.file());
                    let shares_rank = others.iter().any(|o| o.rank() == mv.from.rank());
                    let file_char = char::from(b'a' + mv.from.file() as u8);
                    let rank_char = char::from(b'1' + mv.from.rank() as u8);
                    if !shares_file { s.push(file_char); }
                    else if !shares_rank { s.push(rank_char); }
                    else { s.push(file_char); s.push(rank_char); }
                }
            }
        }
        if capture { s.push('x'); }
        s.push_str(&format!("{}", mv.to));
        if let Some(promo) = mv.promotion {
            s.push('=');
            s.push(piece_char(promo));
        }
        s
    };

    let mut next = board.clone();
    next.play(mv);
    if !next.checkers().is_empty() {
        let mut replies = false;
        next.generate_moves(|_| { replies = true; true });
        san.push(if replies { '+' } else { '#' });
    }
    san
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves_to(pos: &Position, to: &str) -> Vec<Move> {
        pos.legal_moves().into_iter().filter(|m| format!("{}", m.to) == to).collect()
    }

    #[test]
    fn san_disambiguates_knight_captures_by_file() {
        let pos = Position::from_fen("k2q4/3p4/5N2/4N3/8/8/8/4K3 w - - 0 1").unwrap();
        let found = moves_to(&pos, "d7");
        assert_eq!(found.len(), 2, "expected two knight captures to d7");
        for m in found {
            let san = pos.to_algebraic(m).unwrap();
            assert!(san == "Nexd7" || san == "Nfxd7", "san={}", san);
        }
    }

    #[test]
    fn san_disambiguates_rook_quiet_by_rank() {
        let pos = Position::from_fen("7k/8/8/8/8/R7/8/R3K3 w - - 0 1").unwrap();
        let found = moves_to(&pos, "a2");
        assert_eq!(found.len(), 2);
        for m in found {
            let san = pos.to_algebraic(m).unwrap();
            assert!(san == "R1a2" || san == "R3a2", "san={}", san);
        }
    }

    #[test]
    fn san_castling_and_mate_suffix() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let short = pos.parse_uci("e1g1").expect("short castling legal");
        assert_eq!(pos.to_algebraic(short).as_deref(), Some("O-O"));
        let long = pos.parse_uci("e1c1").expect("long castling legal");
        assert_eq!(pos.to_algebraic(long).as_deref(), Some("O-O-O"));
        assert_eq!(pos.uci(short), "e1g1");

        let mate = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let ra8 = mate.parse_uci("a1a8").unwrap();
        assert_eq!(mate.to_algebraic(ra8).as_deref(), Some("Ra8#"));
    }

    #[test]
    fn san_pawn_capture_and_promotion() {
        let pos = Position::from_fen("1n5k/P7/8/3p4/4P3/8/8/7K w - - 0 1").unwrap();
        let exd5 = pos.parse_uci("e4d5").unwrap();
        assert_eq!(pos.to_algebraic(exd5).as_deref(), Some("exd5"));
        let axb8 = pos.parse_uci("a7b8q").unwrap();
        assert_eq!(pos.to_algebraic(axb8).as_deref(), Some("axb8=Q+"));
    }

    #[test]
    fn attackers_include_sliders_through_empty_squares_only() {
        let pos = Position::from_fen("4k3/8/8/8/3p4/8/8/R2QK3 w - - 0 1").unwrap();
        let d4 = Square::D4;
        let white = pos.attackers(Color::White, d4);
        assert!(white.has(Square::D1), "queen on d1 sees d4");
        assert!(!white.has(Square::A1));
        let d2 = pos.attackers(Color::White, Square::D2);
        assert!(d2.has(Square::D1) && d2.has(Square::E1));
        let e3 = pos.attackers(Color::Black, Square::E3);
        assert!(e3.has(Square::D4), "black pawn on d4 attacks e3");
    }

    #[test]
    fn apply_and_revert_restore_fen() {
        let mut pos = Position::startpos();
        let start = pos.fen();
        let mv = pos.parse_uci("e2e4").unwrap();
        pos.apply(mv);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.revert(), Some(mv));
        assert_eq!(pos.fen(), start);
        assert_eq!(pos.revert(), None);
    }

    #[test]
    fn resolve_move_maps_castling_and_autoqueens() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = pos.resolve_move(Square::E1, Square::G1, None).expect("castles");
        assert_eq!(mv.to, Square::H1);
        let promo = Position::from_fen("7k/P7/8/8/8/8/8/7K w - - 0 1").unwrap();
        let mv = promo.resolve_move(Square::A7, Square::A8, None).unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }
}
