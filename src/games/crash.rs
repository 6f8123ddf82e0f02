//! Crash: inverse-CDF crash point from a uniform float.

use super::{GameResult, Play};
use crate::errors::{FairnessError, FairnessResult};
use crate::extractor::{floor_to, RoundRng};

pub const MIN_CASHOUT: f64 = 1.01;

// Keeps ln(f) and ln(1 - f) finite
const FLOAT_FLOOR: f64 = 0.001;
const FLOAT_CEIL: f64 = 0.999;

pub fn validate(cashout: f64, ceiling: f64) -> FairnessResult<()> {
    if !cashout.is_finite() || cashout < MIN_CASHOUT || cashout > ceiling {
        return Err(FairnessError::InvalidParameters(format!(
            "crash cashout {} outside [{}, {}]",
            cashout, MIN_CASHOUT, ceiling
        )));
    }
    Ok(())
}

/// `floor100(ln f / ln(1 - edge))`, capped at `ceiling`
pub fn crash_point(f: f64, house_edge: f64, ceiling: f64) -> f64 {
    let f = f.clamp(FLOAT_FLOOR, FLOAT_CEIL);
    floor_to(f.ln() / (1.0 - house_edge).ln(), 2).min(ceiling)
}

pub(crate) fn play(
    rng: &mut RoundRng<'_>,
    cashout: f64,
    house_edge: f64,
    ceiling: f64,
) -> FairnessResult<Play> {
    let (f, draw) = rng.uniform_float()?;
    let crash_point = crash_point(f, house_edge, ceiling);
    Ok(Play {
        draw,
        result: GameResult::Crash { crash_point },
        multiplier: cashout,
        is_win: cashout <= crash_point,
        house_edge,
    })
}
