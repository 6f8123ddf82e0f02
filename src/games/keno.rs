//! All-hit keno: ten numbers drawn from 1..=40, every pick must be drawn.

use super::{GameResult, Play};
use crate::errors::{FairnessError, FairnessResult};
use crate::extractor::{floor_to, Draw, RoundRng};
use crate::integrity_violation;

pub const POOL_SIZE: u8 = 40;
pub const DRAW_COUNT: usize = 10;

pub fn validate(picks: &[u8], max_picks: usize) -> FairnessResult<()> {
    if picks.is_empty() || picks.len() > max_picks {
        return Err(FairnessError::InvalidParameters(format!(
            "keno needs 1..={} picks, got {}",
            max_picks,
            picks.len()
        )));
    }
    let mut seen = [false; POOL_SIZE as usize + 1];
    for &pick in picks {
        if !(1..=POOL_SIZE).contains(&pick) {
            return Err(FairnessError::InvalidParameters(format!(
                "keno pick {} outside 1..={}",
                pick, POOL_SIZE
            )));
        }
        if std::mem::replace(&mut seen[pick as usize], true) {
            return Err(FairnessError::InvalidParameters(format!("keno pick {} repeated", pick)));
        }
    }
    Ok(())
}

fn binomial(n: u64, k: u64) -> u64 {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Chance that all `picks` numbers are among the draws: C(10, k) / C(40, k)
pub fn win_probability(picks: usize) -> f64 {
    let k = picks as u64;
    binomial(DRAW_COUNT as u64, k) as f64 / binomial(POOL_SIZE as u64, k) as f64
}

pub fn multiplier(picks: usize, house_edge: f64) -> f64 {
    floor_to((1.0 - house_edge) / win_probability(picks), 4)
}

/// Partial Fisher-Yates: draw `i` swaps slot `i` with slot `i + uniform_int(40 - i)`
pub fn draw_numbers(rng: &mut RoundRng<'_>) -> FairnessResult<(Vec<u8>, Draw)> {
    let mut pool: Vec<u8> = (1..=POOL_SIZE).collect();
    let mut first = None;
    for i in 0..DRAW_COUNT {
        let draw = rng.uniform_int((pool.len() - i) as u32)?;
        pool.swap(i, i + draw.value as usize);
        first.get_or_insert(draw);
    }
    let first = first.ok_or_else(|| integrity_violation!("keno drew no numbers"))?;
    pool.truncate(DRAW_COUNT);
    Ok((pool, first))
}

pub(crate) fn play(rng: &mut RoundRng<'_>, picks: &[u8], house_edge: f64) -> FairnessResult<Play> {
    let (draws, first) = draw_numbers(rng)?;
    let is_win = picks.iter().all(|pick| draws.contains(pick));
    Ok(Play {
        draw: first,
        result: GameResult::Keno { draws },
        multiplier: multiplier(picks.len(), house_edge),
        is_win,
        house_edge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_validation() {
        assert!(validate(&[1, 40], 5).is_ok());
        assert!(validate(&[], 5).is_err());
        assert!(validate(&[0], 5).is_err());
        assert!(validate(&[41], 5).is_err());
        assert!(validate(&[7, 7], 5).is_err());
        assert!(validate(&[1, 2, 3, 4, 5, 6], 5).is_err());
    }

    #[test]
    fn test_probabilities() {
        assert_eq!(win_probability(1), 0.25);
        assert!((win_probability(2) - 45.0 / 780.0).abs() < 1e-15);
        assert_eq!(multiplier(1, 0.02), 3.92);
        assert_eq!(multiplier(2, 0.02), 16.9866);
    }

    #[test]
    fn test_draws_are_distinct_and_in_range() {
        for nonce in 0..50 {
            let mut rng = RoundRng::new("server", "client", nonce, 3 << 24);
            let (draws, first) = draw_numbers(&mut rng).unwrap();
            assert_eq!(draws.len(), DRAW_COUNT);
            let mut sorted = draws.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), DRAW_COUNT);
            assert!(draws.iter().all(|n| (1..=POOL_SIZE).contains(n)));
            assert_eq!(first.cursor, 3 << 24);
        }
    }

    #[test]
    fn test_draw_regression() {
        let mut rng = RoundRng::new("abcdefghijklmnopqrstuvwxyz012345", "player1", 0, 3 << 24);
        let (draws, first) = draw_numbers(&mut rng).unwrap();
        assert_eq!(draws, vec![35, 14, 16, 39, 10, 1, 26, 34, 8, 7]);
        assert_eq!(first.word, 4_151_141_954);
    }
}
