use crate::errors::{FairnessError, FairnessResult};
use crate::integrity_violation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Basis points per unit of multiplier
const MULTIPLIER_SCALE: u128 = 10_000;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Dice,
    CoinFlip,
    Crash,
    Keno,
}

impl GameType {
    pub const ALL: [GameType; 4] = [GameType::Dice, GameType::CoinFlip, GameType::Crash, GameType::Keno];

    /// First cursor of this game's namespace
    ///
    /// Namespaces are 2^24 cursors wide, so two games played on the same nonce
    /// never read the same digest.
    pub fn base_cursor(self) -> u32 {
        let index: u32 = match self {
            GameType::Dice => 0,
            GameType::CoinFlip => 1,
            GameType::Crash => 2,
            GameType::Keno => 3,
        };
        index << 24
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Dice => write!(f, "dice"),
            GameType::CoinFlip => write!(f, "coinflip"),
            GameType::Crash => write!(f, "crash"),
            GameType::Keno => write!(f, "keno"),
        }
    }
}

impl FromStr for GameType {
    type Err = FairnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dice" => Ok(GameType::Dice),
            "coinflip" => Ok(GameType::CoinFlip),
            "crash" => Ok(GameType::Crash),
            "keno" => Ok(GameType::Keno),
            other => Err(FairnessError::InvalidParameters(format!("Unknown game type '{}'", other))),
        }
    }
}

/// Coin side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    pub fn opposite(self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

impl FromStr for CoinSide {
    type Err = FairnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heads" => Ok(CoinSide::Heads),
            "tails" => Ok(CoinSide::Tails),
            other => Err(FairnessError::InvalidParameters(format!("Unknown coin side '{}'", other))),
        }
    }
}

/// Player-chosen parameters (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameParams {
    /// Win when the roll is strictly above `target`
    Dice { target: u8 },
    CoinFlip { choice: CoinSide },
    /// Multiplier the player committed to cash out at
    Crash { cashout: f64 },
    /// Numbers in 1..=40 that must all be drawn
    Keno { picks: Vec<u8> },
}

impl GameParams {
    pub fn game_type(&self) -> GameType {
        match self {
            GameParams::Dice { .. } => GameType::Dice,
            GameParams::CoinFlip { .. } => GameType::CoinFlip,
            GameParams::Crash { .. } => GameType::Crash,
            GameParams::Keno { .. } => GameType::Keno,
        }
    }
}

/// Game-specific result (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameResult {
    Dice { roll: u8 },
    CoinFlip { side: CoinSide },
    Crash { crash_point: f64 },
    /// Drawn numbers in draw order
    Keno { draws: Vec<u8> },
}

/// One bet's result; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundOutcome {
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub game_type: GameType,
    pub params: GameParams,
    /// Hex HMAC digest the result was read from
    pub combined_digest: String,
    /// Cursor the digest was taken at
    pub cursor: u32,
    /// Accepted 32-bit word before game mapping
    pub raw_value: u32,
    pub result: GameResult,
    pub multiplier: f64,
    pub is_win: bool,
    pub house_edge: f64,
}

impl RoundOutcome {
    /// Payout in the bet's minor units; zero on a loss
    ///
    /// Multipliers carry at most four decimals, so the product is taken in
    /// basis points to keep values like 1.15 from truncating to 1.1499...
    pub fn payout(&self, bet_amount: u64) -> u64 {
        if !self.is_win {
            return 0;
        }
        let basis_points = (self.multiplier * MULTIPLIER_SCALE as f64).round() as u128;
        let scaled = (bet_amount as u128).saturating_mul(basis_points) / MULTIPLIER_SCALE;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Reject outcomes that could not be recomputed later
    pub fn ensure_verifiable(&self) -> FairnessResult<()> {
        let digest_ok = self.combined_digest.len() == 64
            && self.combined_digest.bytes().all(|b| b.is_ascii_hexdigit());
        if !digest_ok {
            return Err(integrity_violation!(
                "outcome at nonce {} carries malformed digest '{}'",
                self.nonce,
                self.combined_digest
            ));
        }
        if self.game_type != self.params.game_type() {
            return Err(integrity_violation!(
                "outcome game type {} does not match params for {}",
                self.game_type,
                self.params.game_type()
            ));
        }
        Ok(())
    }

    /// Player-facing projection; pass the server seed only once revealed
    pub fn proof(&self, revealed_server_seed: Option<&str>) -> FairnessProof {
        FairnessProof {
            server_seed: revealed_server_seed.map(str::to_string),
            server_seed_hash: self.server_seed_hash.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            combined_digest: self.combined_digest.clone(),
            result: self.result.clone(),
        }
    }
}

/// Read-only data a player needs to check a round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FairnessProof {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_seed: Option<String>,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub combined_digest: String,
    pub result: GameResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_cursors_are_disjoint() {
        let cursors: Vec<u32> = GameType::ALL.iter().map(|g| g.base_cursor()).collect();
        assert_eq!(cursors, vec![0, 1 << 24, 2 << 24, 3 << 24]);
    }

    #[test]
    fn test_params_json_shape() {
        let params = GameParams::Dice { target: 50 };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({"game": "dice", "target": 50}));

        let parsed: GameParams =
            serde_json::from_str(r#"{"game":"coinflip","choice":"heads"}"#).unwrap();
        assert_eq!(parsed, GameParams::CoinFlip { choice: CoinSide::Heads });
        assert_eq!(parsed.game_type(), GameType::CoinFlip);
    }

    #[test]
    fn test_game_type_parse() {
        assert_eq!("Crash".parse::<GameType>().unwrap(), GameType::Crash);
        assert_eq!(GameType::CoinFlip.to_string(), "coinflip");
        assert!("roulette".parse::<GameType>().is_err());
    }

    fn winning_outcome(params: GameParams, multiplier: f64) -> RoundOutcome {
        RoundOutcome {
            server_seed_hash: "00".repeat(32),
            client_seed: "player1".to_string(),
            nonce: 0,
            game_type: params.game_type(),
            params,
            combined_digest: "00".repeat(32),
            cursor: 0,
            raw_value: 0,
            result: GameResult::Dice { roll: 99 },
            multiplier,
            is_win: true,
            house_edge: 0.02,
        }
    }

    #[test]
    fn test_payout_exact_for_decimal_multipliers() {
        let outcome = winning_outcome(GameParams::Crash { cashout: 1.15 }, 1.15);
        assert_eq!(outcome.payout(100), 115);
        assert_eq!(outcome.payout(1), 1);

        let outcome = winning_outcome(GameParams::Crash { cashout: 2.07 }, 2.07);
        assert_eq!(outcome.payout(100), 207);
    }

    #[test]
    fn test_payout_saturates() {
        let outcome = winning_outcome(GameParams::Crash { cashout: 100.0 }, 100.0);
        assert_eq!(outcome.payout(u64::MAX), u64::MAX);

        let mut lost = outcome.clone();
        lost.is_win = false;
        assert_eq!(lost.payout(u64::MAX), 0);
    }

    #[test]
    fn test_outcome_missing_digest_fails_to_parse() {
        let json = serde_json::json!({
            "server_seed_hash": "00",
            "client_seed": "c",
            "nonce": 0,
            "game_type": "dice",
            "params": {"game": "dice", "target": 50},
            "cursor": 0,
            "raw_value": 1,
            "result": {"game": "dice", "roll": 1},
            "multiplier": 1.96,
            "is_win": false,
            "house_edge": 0.02
        });
        assert!(serde_json::from_value::<RoundOutcome>(json).is_err());
    }
}
