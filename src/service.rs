//! Engine service: the bet and rotation surfaces
//!
//! Composes the seed manager, the outcome engine and the metrics registry.
//! Storage is chosen from configuration; everything else is stateless.

use crate::config::{EngineConfig, StorageBackend};
use crate::errors::{FairnessError, FairnessResult};
use crate::games::{FairnessProof, GameParams, OutcomeEngine, RoundOutcome};
use crate::metrics::EngineMetrics;
use crate::seeds::{MemorySeedStore, Rotation, RotationResponse, SeedCommitment, SeedManager, SeedPairId, SeedStore};
use crate::verifier::{FairnessVerifier, VerifyRequest, VerifyResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Settled bet handed to the wallet collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetReceipt {
    pub outcome: RoundOutcome,
    /// Minor units
    pub bet_amount: u64,
    /// `bet_amount` times the multiplier in basis points on a win, else 0
    pub payout: u64,
}

pub struct FairnessEngine {
    config: EngineConfig,
    seeds: SeedManager,
    engine: OutcomeEngine,
    verifier: FairnessVerifier,
    metrics: Option<EngineMetrics>,
}

impl FairnessEngine {
    /// Build the engine over an explicit store
    pub fn with_store(config: EngineConfig, store: Arc<dyn SeedStore>) -> FairnessResult<Self> {
        config.validate()?;
        let metrics = if config.monitoring.enable_metrics {
            Some(EngineMetrics::new()?)
        } else {
            None
        };
        let engine = OutcomeEngine::new(config.games.clone());
        Ok(Self {
            seeds: SeedManager::new(store, config.seeds.clone()),
            verifier: FairnessVerifier::new(engine.clone()),
            engine,
            metrics,
            config,
        })
    }

    /// Build the engine with the store named in `config.storage`
    pub fn from_config(config: EngineConfig) -> FairnessResult<Self> {
        let store: Arc<dyn SeedStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemorySeedStore::new()),
            #[cfg(feature = "rocksdb")]
            StorageBackend::Rocksdb => {
                info!(path = %config.storage.data_directory, "Opening RocksDB seed store");
                Arc::new(crate::seeds::RocksSeedStore::open(&config.storage.data_directory)?)
            }
            #[cfg(not(feature = "rocksdb"))]
            StorageBackend::Rocksdb => {
                return Err(FairnessError::Configuration(
                    "rocksdb backend requested but fairroll was built without the `rocksdb` feature"
                        .to_string(),
                ))
            }
        };
        Self::with_store(config, store)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn seeds(&self) -> &SeedManager {
        &self.seeds
    }

    pub fn outcome_engine(&self) -> &OutcomeEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_ref()
    }

    pub async fn create_seed_pair(&self, client_seed: Option<String>) -> FairnessResult<SeedCommitment> {
        let commitment = self.observe(self.seeds.create_seed_pair(client_seed).await)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_seed_pair_created();
        }
        Ok(commitment)
    }

    /// Play one round against a seed pair
    ///
    /// Params and amount are checked before a nonce is claimed. Once claimed,
    /// the nonce stays spent whatever happens after.
    pub async fn place_bet(
        &self,
        seed_pair_id: SeedPairId,
        params: GameParams,
        bet_amount: u64,
    ) -> FairnessResult<BetReceipt> {
        if bet_amount == 0 {
            return Err(FairnessError::InvalidParameters("bet amount must be positive".to_string()));
        }
        self.engine.validate(&params)?;

        let pair = self.observe(self.seeds.claim(seed_pair_id).await)?;
        let outcome = self.observe(self.engine.derive_for_pair(&pair, &params))?;

        if let Some(metrics) = &self.metrics {
            metrics.record_round(outcome.game_type, outcome.is_win);
        }

        let payout = outcome.payout(bet_amount);
        info!(
            seed_pair_id = %seed_pair_id,
            nonce = outcome.nonce,
            game = %outcome.game_type,
            is_win = outcome.is_win,
            bet_amount,
            payout,
            "Bet settled"
        );

        Ok(BetReceipt {
            outcome,
            bet_amount,
            payout,
        })
    }

    pub async fn rotate(&self, seed_pair_id: SeedPairId, new_client_seed: Option<String>) -> FairnessResult<Rotation> {
        let rotation = self.observe(self.seeds.rotate(seed_pair_id, new_client_seed).await)?;
        if rotation.rotated {
            if let Some(metrics) = &self.metrics {
                metrics.record_rotation();
            }
        }
        Ok(rotation)
    }

    /// Rotation in its public wire shape
    pub async fn rotate_seed(
        &self,
        seed_pair_id: SeedPairId,
        new_client_seed: Option<String>,
    ) -> FairnessResult<RotationResponse> {
        self.rotate(seed_pair_id, new_client_seed).await?.to_response()
    }

    pub async fn commitment(&self, seed_pair_id: SeedPairId) -> FairnessResult<SeedCommitment> {
        self.seeds.commitment(seed_pair_id).await
    }

    /// Player-facing proof for a round; carries the server seed once the pair is revealed
    pub async fn proof(&self, seed_pair_id: SeedPairId, outcome: &RoundOutcome) -> FairnessResult<FairnessProof> {
        let commitment = self.seeds.commitment(seed_pair_id).await?;
        if commitment.server_seed_hash != outcome.server_seed_hash {
            return Err(FairnessError::InvalidParameters(format!(
                "outcome at nonce {} was not played on seed pair {}",
                outcome.nonce, seed_pair_id
            )));
        }
        outcome.ensure_verifiable()?;
        Ok(outcome.proof(commitment.revealed_server_seed.as_deref()))
    }

    pub fn verify(&self, request: &VerifyRequest) -> FairnessResult<VerifyResponse> {
        let response = self.observe(self.verifier.verify_request(request))?;
        if let Some(metrics) = &self.metrics {
            metrics.record_verification(response.valid);
        }
        Ok(response)
    }

    fn observe<T>(&self, result: FairnessResult<T>) -> FairnessResult<T> {
        if let Err(e) = &result {
            if let Some(metrics) = &self.metrics {
                metrics.observe_error(e);
            }
            if matches!(e, FairnessError::IntegrityViolation(_)) {
                warn!(code = e.code(), error = %e, "Integrity violation");
            }
        }
        result
    }
}
