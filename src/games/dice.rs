//! Dice: roll 0..=99, win strictly above the chosen target.

use super::{GameResult, Play};
use crate::errors::{FairnessError, FairnessResult};
use crate::extractor::{floor_to, RoundRng};

pub const SIDES: u32 = 100;
pub const MAX_TARGET: u8 = 99;
/// Lowest multiplier ever offered
pub const MIN_MULTIPLIER: f64 = 1.01;

pub fn validate(target: u8) -> FairnessResult<()> {
    if target > MAX_TARGET {
        return Err(FairnessError::InvalidParameters(format!(
            "dice target {} outside 0..={}",
            target, MAX_TARGET
        )));
    }
    Ok(())
}

/// Published win probability for a target
pub fn win_probability(target: u8) -> f64 {
    (100 - target as u32) as f64 / 100.0
}

/// `(1 - edge) / p` truncated to 4 decimals, never below 1.01
pub fn multiplier(target: u8, house_edge: f64) -> f64 {
    floor_to((1.0 - house_edge) / win_probability(target), 4).max(MIN_MULTIPLIER)
}

pub(crate) fn play(rng: &mut RoundRng<'_>, target: u8, house_edge: f64) -> FairnessResult<Play> {
    let draw = rng.uniform_int(SIDES)?;
    let roll = draw.value as u8;
    Ok(Play {
        draw,
        result: GameResult::Dice { roll },
        multiplier: multiplier(target, house_edge),
        is_win: roll > target,
        house_edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_range() {
        assert!(validate(0).is_ok());
        assert!(validate(99).is_ok());
        assert!(matches!(validate(100), Err(FairnessError::InvalidParameters(_))));
    }

    #[test]
    fn test_multiplier_values() {
        assert_eq!(multiplier(50, 0.02), 1.96);
        assert_eq!(multiplier(98, 0.02), 49.0);
        assert_eq!(multiplier(99, 0.02), 98.0);
        // 0.98 / 1.0 would pay less than the stake
        assert_eq!(multiplier(0, 0.02), MIN_MULTIPLIER);
    }

    #[test]
    fn test_edge_preserved_where_floor_inactive() {
        for target in 0..=98u8 {
            let p = win_probability(target);
            let m = multiplier(target, 0.02);
            let fair = floor_to(0.98 / p, 4);
            if fair >= MIN_MULTIPLIER {
                assert!((p * m - 0.98).abs() < 1e-4, "target {} returns {}", target, p * m);
            } else {
                assert_eq!(m, MIN_MULTIPLIER, "target {}", target);
            }
        }
    }

    #[test]
    fn test_play_regression() {
        let mut rng = RoundRng::new("abcdefghijklmnopqrstuvwxyz012345", "player1", 0, 0);
        let play = play(&mut rng, 50, 0.02).unwrap();
        assert_eq!(play.result, GameResult::Dice { roll: 90 });
        assert!(play.is_win);
        assert_eq!(play.draw.word, 196_159_390);
    }
}
