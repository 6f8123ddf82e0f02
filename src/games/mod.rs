pub mod coinflip;
pub mod crash;
pub mod dice;
pub mod engine;
pub mod keno;
pub mod types;

pub use engine::OutcomeEngine;
pub use types::*;

use crate::extractor::Draw;

/// A settled round before it is stamped with seeds and params
#[derive(Debug, Clone)]
pub(crate) struct Play {
    /// First accepted draw of the round
    pub draw: Draw,
    pub result: GameResult,
    pub multiplier: f64,
    pub is_win: bool,
    pub house_edge: f64,
}
