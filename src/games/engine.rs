use crate::config::GameConfig;
use crate::errors::FairnessResult;
use crate::extractor::{sha256_hex, RoundRng};
use crate::games::types::{GameParams, GameType, RoundOutcome};
use crate::games::{coinflip, crash, dice, keno, Play};
use crate::seeds::SeedPair;
use tracing::debug;

/// Pure outcome derivation
///
/// Holds no state beyond the house parameters; the same seeds, nonce and
/// params always produce the same `RoundOutcome`.
#[derive(Debug, Clone)]
pub struct OutcomeEngine {
    config: GameConfig,
}

impl OutcomeEngine {
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn house_edge(&self, game: GameType) -> f64 {
        match game {
            GameType::Dice => self.config.dice_house_edge,
            GameType::CoinFlip => self.config.coinflip_house_edge,
            GameType::Crash => self.config.crash_house_edge,
            GameType::Keno => self.config.keno_house_edge,
        }
    }

    /// Reject params no round could be played with
    pub fn validate(&self, params: &GameParams) -> FairnessResult<()> {
        match params {
            GameParams::Dice { target } => dice::validate(*target),
            GameParams::CoinFlip { .. } => Ok(()),
            GameParams::Crash { cashout } => crash::validate(*cashout, self.config.crash_ceiling),
            GameParams::Keno { picks } => keno::validate(picks, self.config.keno_max_picks),
        }
    }

    /// Derive one round from explicit seeds
    pub fn derive(
        &self,
        server_seed: &str,
        client_seed: &str,
        nonce: u64,
        params: &GameParams,
    ) -> FairnessResult<RoundOutcome> {
        self.validate(params)?;

        let game_type = params.game_type();
        let house_edge = self.house_edge(game_type);
        let mut rng = RoundRng::new(server_seed, client_seed, nonce, game_type.base_cursor());

        let play: Play = match params {
            GameParams::Dice { target } => dice::play(&mut rng, *target, house_edge)?,
            GameParams::CoinFlip { choice } => coinflip::play(&mut rng, *choice, house_edge)?,
            GameParams::Crash { cashout } => {
                crash::play(&mut rng, *cashout, house_edge, self.config.crash_ceiling)?
            }
            GameParams::Keno { picks } => keno::play(&mut rng, picks, house_edge)?,
        };

        debug!(
            game = %game_type,
            nonce,
            cursor = play.draw.cursor,
            draws_consumed = rng.cursor() - game_type.base_cursor(),
            is_win = play.is_win,
            "Derived round"
        );

        Ok(RoundOutcome {
            server_seed_hash: sha256_hex(server_seed.as_bytes()),
            client_seed: client_seed.to_string(),
            nonce,
            game_type,
            params: params.clone(),
            combined_digest: play.draw.digest_hex(),
            cursor: play.draw.cursor,
            raw_value: play.draw.word,
            result: play.result,
            multiplier: play.multiplier,
            is_win: play.is_win,
            house_edge: play.house_edge,
        })
    }

    /// Derive against a claimed pair snapshot; its `nonce` is the claimed one
    pub fn derive_for_pair(&self, pair: &SeedPair, params: &GameParams) -> FairnessResult<RoundOutcome> {
        self.derive(pair.server_seed().as_str(), &pair.client_seed, pair.nonce, params)
    }
}

impl Default for OutcomeEngine {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
