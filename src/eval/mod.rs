//! Board-control heuristics: attack/defense control, permanent pawn
//! weaknesses and hypothetical square mobility.
//!
//! All three are advisory display data computed from the current position
//! only. They say nothing about move legality.

pub mod control;
pub mod mobility;
pub mod weakness;

use cozy_chess::{Color, Square};
use serde::Serialize;

use crate::board::Rules;
pub use control::{Classification, ControlMap, ControlValue, SquareControl};
pub use mobility::MobilityMap;
pub use weakness::WeakSquares;

/// Everything the host paints for one frame.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub control: ControlMap,
    pub weak: WeakSquares,
    pub mobility: MobilityMap,
}

impl Overlay {
    /// Runs the three evaluators concurrently; they only read the position.
    pub fn compute<R: Rules + Sync + ?Sized>(rules: &R) -> Self {
        let (control, (weak, mobility)) = rayon::join(
            || ControlMap::evaluate(rules),
            || rayon::join(|| WeakSquares::evaluate(rules), || MobilityMap::evaluate(rules)),
        );
        Self { control, weak, mobility }
    }

    pub fn report(&self) -> OverlayReport {
        let squares = Square::ALL
            .into_iter()
            .map(|sq| {
                let c = self.control.get(sq);
                let (controller, intensity) = match c.classification {
                    Classification::Neutral => ("neutral".to_string(), None),
                    Classification::Tie => ("tie".to_string(), None),
                    Classification::Controlled { by, intensity } => (color_name(by).to_string(), Some(intensity)),
                };
                SquareReport {
                    square: format!("{}", sq),
                    white_attack: finite_or_none(c.value.white_attack),
                    white_defense: c.value.white_defense,
                    black_attack: finite_or_none(c.value.black_attack),
                    black_defense: c.value.black_defense,
                    controller,
                    intensity,
                    contested: c.contested,
                    weak_for_white: self.weak.is_weak(Color::White, sq),
                    weak_for_black: self.weak.is_weak(Color::Black, sq),
                    mobility: self.mobility.get(sq),
                }
            })
            .collect();
        OverlayReport { squares }
    }
}

fn color_name(color: Color) -> &'static str {
    match color { Color::White => "white", Color::Black => "black" }
}

// JSON has no infinity; a king among the attackers reports as null.
fn finite_or_none(v: f64) -> Option<f64> { v.is_finite().then_some(v) }

#[derive(Clone, Debug, Serialize)]
pub struct SquareReport {
    pub square: String,
    pub white_attack: Option<f64>,
    pub white_defense: f64,
    pub black_attack: Option<f64>,
    pub black_defense: f64,
    pub controller: String,
    pub intensity: Option<u8>,
    pub contested: bool,
    pub weak_for_white: bool,
    pub weak_for_black: bool,
    pub mobility: u8,
}

/// Serializable snapshot of an [`Overlay`], square order a1..h8.
#[derive(Clone, Debug, Serialize)]
pub struct OverlayReport {
    pub squares: Vec<SquareReport>,
}
