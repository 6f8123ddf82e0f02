//! Coin flip with a 49/51 split against the caller.

use super::{CoinSide, GameResult, Play};
use crate::errors::FairnessResult;
use crate::extractor::{floor_to, RoundRng};

/// Draws below this land on the player's call
pub const CALL_LANDS_BELOW: u32 = 49;
pub const WIN_PROBABILITY: f64 = 0.49;

/// `(1 - e) / 0.49` floored to four decimals, so 0.03 pays 1.9795 rather than 1.97959...
pub fn multiplier(house_edge: f64) -> f64 {
    floor_to((1.0 - house_edge) / WIN_PROBABILITY, 4)
}

/// Side the coin shows for draw `v`
///
/// The face is relative to the call: whichever side was called lands iff
/// `v < 49`. The same draw therefore shows heads for a `heads` call and tails
/// for a `tails` call, so a verifier needs the call to recompute the face.
pub fn landed_side(v: u32, choice: CoinSide) -> CoinSide {
    if v < CALL_LANDS_BELOW {
        choice
    } else {
        choice.opposite()
    }
}

pub(crate) fn play(rng: &mut RoundRng<'_>, choice: CoinSide, house_edge: f64) -> FairnessResult<Play> {
    let draw = rng.uniform_int(100)?;
    let side = landed_side(draw.value, choice);
    Ok(Play {
        draw,
        result: GameResult::CoinFlip { side },
        multiplier: multiplier(house_edge),
        is_win: side == choice,
        house_edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_favours_house_for_either_call() {
        for choice in [CoinSide::Heads, CoinSide::Tails] {
            let wins = (0..100).filter(|&v| landed_side(v, choice) == choice).count();
            assert_eq!(wins, 49);
        }
    }

    #[test]
    fn test_heads_call_mapping() {
        assert_eq!(landed_side(0, CoinSide::Heads), CoinSide::Heads);
        assert_eq!(landed_side(48, CoinSide::Heads), CoinSide::Heads);
        assert_eq!(landed_side(49, CoinSide::Heads), CoinSide::Tails);
        assert_eq!(landed_side(99, CoinSide::Heads), CoinSide::Tails);
    }

    #[test]
    fn test_tails_call_mapping() {
        assert_eq!(landed_side(0, CoinSide::Tails), CoinSide::Tails);
        assert_eq!(landed_side(48, CoinSide::Tails), CoinSide::Tails);
        assert_eq!(landed_side(49, CoinSide::Tails), CoinSide::Heads);
        assert_eq!(landed_side(99, CoinSide::Tails), CoinSide::Heads);
    }

    #[test]
    fn test_face_depends_on_call() {
        for v in 0..100 {
            assert_ne!(landed_side(v, CoinSide::Heads), landed_side(v, CoinSide::Tails));
        }
    }

    #[test]
    fn test_multiplier() {
        assert_eq!(multiplier(0.03), 1.9795);
        assert!(multiplier(0.03) < 0.97 / WIN_PROBABILITY);
        assert_eq!(multiplier(0.02), 2.0);
    }
}
