//! Public verification
//!
//! Anyone holding a revealed server seed can recompute a round and compare it
//! to what the operator reported. Comparison runs in a fixed field order and
//! names the first field that differs.

use crate::errors::{FairnessError, FairnessResult};
use crate::extractor::sha256_hex;
use crate::games::{GameParams, GameType, OutcomeEngine, RoundOutcome};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Commitment check: `sha256_hex(server_seed) == server_seed_hash`
pub fn verify_commitment(server_seed: &str, server_seed_hash: &str) -> bool {
    sha256_hex(server_seed.as_bytes()).eq_ignore_ascii_case(server_seed_hash)
}

/// Result of recomputing one round
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch_field: Option<String>,
    pub recomputed: RoundOutcome,
}

/// Inbound public verification payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyRequest {
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub game_type: GameType,
    pub params: GameParams,
    pub claimed_outcome: RoundOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mismatch_field: Option<String>,
}

impl From<Verification> for VerifyResponse {
    fn from(v: Verification) -> Self {
        Self {
            valid: v.valid,
            mismatch_field: v.mismatch_field,
        }
    }
}

/// First differing field between a recomputed and a claimed outcome
pub fn first_mismatch(recomputed: &RoundOutcome, claimed: &RoundOutcome) -> Option<&'static str> {
    let checks: [(&'static str, bool); 12] = [
        (
            "server_seed_hash",
            recomputed.server_seed_hash.eq_ignore_ascii_case(&claimed.server_seed_hash),
        ),
        ("client_seed", recomputed.client_seed == claimed.client_seed),
        ("nonce", recomputed.nonce == claimed.nonce),
        ("game_type", recomputed.game_type == claimed.game_type),
        ("params", recomputed.params == claimed.params),
        (
            "combined_digest",
            recomputed.combined_digest.eq_ignore_ascii_case(&claimed.combined_digest),
        ),
        ("cursor", recomputed.cursor == claimed.cursor),
        ("raw_value", recomputed.raw_value == claimed.raw_value),
        ("result", recomputed.result == claimed.result),
        ("multiplier", recomputed.multiplier == claimed.multiplier),
        ("is_win", recomputed.is_win == claimed.is_win),
        ("house_edge", recomputed.house_edge == claimed.house_edge),
    ];
    checks.iter().find(|(_, matches)| !matches).map(|(field, _)| *field)
}

/// Recomputes rounds with the house parameters the operator published
#[derive(Debug, Clone, Default)]
pub struct FairnessVerifier {
    engine: OutcomeEngine,
}

impl FairnessVerifier {
    pub fn new(engine: OutcomeEngine) -> Self {
        Self { engine }
    }

    pub fn verify_outcome(
        &self,
        server_seed: &str,
        client_seed: &str,
        nonce: u64,
        params: &GameParams,
        claimed: &RoundOutcome,
    ) -> FairnessResult<Verification> {
        let recomputed = self.engine.derive(server_seed, client_seed, nonce, params)?;
        let mismatch_field = first_mismatch(&recomputed, claimed);

        if let Some(field) = mismatch_field {
            warn!(
                nonce,
                game = %recomputed.game_type,
                mismatch_field = field,
                "Outcome verification failed"
            );
        }

        Ok(Verification {
            valid: mismatch_field.is_none(),
            mismatch_field: mismatch_field.map(str::to_string),
            recomputed,
        })
    }

    pub fn verify_request(&self, request: &VerifyRequest) -> FairnessResult<VerifyResponse> {
        if request.game_type != request.params.game_type() {
            return Err(FairnessError::InvalidParameters(format!(
                "game_type {} does not match params for {}",
                request.game_type,
                request.params.game_type()
            )));
        }
        self.verify_outcome(
            &request.server_seed,
            &request.client_seed,
            request.nonce,
            &request.params,
            &request.claimed_outcome,
        )
        .map(VerifyResponse::from)
    }
}
