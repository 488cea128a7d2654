use std::path::{Path, PathBuf};

use cozy_chess::{Color, Piece};
use log::debug;

/// How one piece is drawn: an image when the sprite file exists, the glyph
/// otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub glyph: char,
    pub image: Option<PathBuf>,
}

/// Sprite table over every {color, piece} pair, built once at startup.
#[derive(Clone, Debug)]
pub struct PieceAssets {
    sprites: [[Sprite; 6]; 2],
}

fn glyph(color: Color, piece: Piece) -> char {
    match (color, piece) {
        (Color::White, Piece::Pawn) => '♙',
        (Color::White, Piece::Knight) => '♘',
        (Color::White, Piece::Bishop) => '♗',
        (Color::White, Piece::Rook) => '♖',
        (Color::White, Piece::Queen) => '♕',
        (Color::White, Piece::King) => '♔',
        (Color::Black, Piece::Pawn) => '♟',
        (Color::Black, Piece::Knight) => '♞',
        (Color::Black, Piece::Bishop) => '♝',
        (Color::Black, Piece::Rook) => '♜',
        (Color::Black, Piece::Queen) => '♛',
        (Color::Black, Piece::King) => '♚',
    }
}

/// `Chess_klt45.svg.png` style sprite name: piece letter, then `lt` for
/// white or `dt` for black.
pub fn sprite_file_name(color: Color, piece: Piece) -> String {
    let letter = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    let tag = if color == Color::White { "lt" } else { "dt" };
    format!("Chess_{}{}45.svg.png", letter, tag)
}

impl PieceAssets {
    /// Looks for sprite files under `dir`; missing files fall back to glyphs.
    pub fn load(dir: Option<&Path>) -> Self {
        let sprites = [Color::White, Color::Black].map(|color| {
            Piece::ALL.map(|piece| {
                let image = dir
                    .map(|d| d.join(sprite_file_name(color, piece)))
                    .filter(|p| p.is_file());
                Sprite { glyph: glyph(color, piece), image }
            })
        });
        let found = sprites.iter().flatten().filter(|s| s.image.is_some()).count();
        debug!("piece sprites: {} images, {} glyph fallbacks", found, 12 - found);
        Self { sprites }
    }

    pub fn sprite(&self, color: Color, piece: Piece) -> &Sprite {
        &self.sprites[color as usize][piece as usize]
    }

    pub fn glyph(&self, color: Color, piece: Piece) -> char { self.sprite(color, piece).glyph }
}
