use crate::config::SeedConfig;
use crate::errors::{FairnessError, FairnessResult};
use crate::seeds::store::{RevealOutcome, SeedStore};
use crate::seeds::types::{validate_client_seed, Rotation, SeedCommitment, SeedPair, SeedPairId};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tracing::{info, warn};

const GENERATED_CLIENT_SEED_LEN: usize = 16;

/// Owns the commit-reveal protocol and the nonce counters
pub struct SeedManager {
    store: Arc<dyn SeedStore>,
    config: SeedConfig,
}

impl SeedManager {
    pub fn new(store: Arc<dyn SeedStore>, config: SeedConfig) -> Self {
        Self { store, config }
    }

    pub(crate) fn store(&self) -> &Arc<dyn SeedStore> {
        &self.store
    }

    /// Commit to a fresh server seed; only the hash leaves this call
    pub async fn create_seed_pair(&self, client_seed: Option<String>) -> FairnessResult<SeedCommitment> {
        let pair = self.generate(client_seed)?;
        let commitment = pair.commitment();
        self.store.insert(pair).await?;

        info!(
            seed_pair_id = %commitment.id,
            server_seed_hash = %commitment.server_seed_hash,
            "Created seed pair"
        );
        Ok(commitment)
    }

    /// Claim the next nonce for a pair
    ///
    /// A returned nonce is spent even if the caller abandons the bet.
    pub async fn next_nonce(&self, id: SeedPairId) -> FairnessResult<u64> {
        Ok(self.claim(id).await?.nonce)
    }

    /// Claim a nonce and return the pair state it was claimed against
    pub(crate) async fn claim(&self, id: SeedPairId) -> FairnessResult<SeedPair> {
        match self.store.claim_nonce(id).await {
            Ok(pair) => {
                // Guards against a store handing back a row whose secret was swapped
                pair.check_commitment()?;
                Ok(pair)
            }
            Err(e @ FairnessError::IntegrityViolation(_)) => {
                warn!(seed_pair_id = %id, error = %e, "Nonce claim refused");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Reveal the active pair and commit to its replacement
    ///
    /// The replacement keeps the old client seed unless a new one is given.
    /// Rotating an already revealed pair changes nothing and reports the
    /// existing reveal.
    pub async fn rotate(&self, id: SeedPairId, new_client_seed: Option<String>) -> FairnessResult<Rotation> {
        if let Some(seed) = &new_client_seed {
            validate_client_seed(seed)?;
        }

        let current = self
            .store
            .load(id)
            .await?
            .ok_or_else(|| FairnessError::SeedPairNotFound(id.to_string()))?;

        let client_seed = new_client_seed.unwrap_or_else(|| current.client_seed.clone());
        let replacement = SeedPair::generate(client_seed, self.config.server_seed_bytes)?;

        match self.store.reveal_and_replace(id, replacement, Utc::now()).await? {
            RevealOutcome::Rotated { revealed, next } => {
                revealed.check_commitment()?;
                info!(
                    seed_pair_id = %revealed.id,
                    next_seed_pair_id = %next.id,
                    nonces_used = revealed.nonce,
                    "Rotated seed pair"
                );
                Ok(Rotation {
                    revealed: revealed.commitment(),
                    next: next.commitment(),
                    rotated: true,
                })
            }
            RevealOutcome::AlreadyRevealed { revealed, successor } => {
                let successor = successor.ok_or_else(|| {
                    crate::integrity_violation!("revealed seed pair {} has no successor", revealed.id)
                })?;
                info!(seed_pair_id = %revealed.id, "Seed pair already revealed; rotation is a no-op");
                Ok(Rotation {
                    revealed: revealed.commitment(),
                    next: successor.commitment(),
                    rotated: false,
                })
            }
        }
    }

    /// Public view of a pair
    pub async fn commitment(&self, id: SeedPairId) -> FairnessResult<SeedCommitment> {
        self.store
            .load(id)
            .await?
            .map(|pair| pair.commitment())
            .ok_or_else(|| FairnessError::SeedPairNotFound(id.to_string()))
    }

    fn generate(&self, client_seed: Option<String>) -> FairnessResult<SeedPair> {
        let client_seed = match client_seed.or_else(|| self.config.default_client_seed.clone()) {
            Some(seed) => seed,
            None => rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(GENERATED_CLIENT_SEED_LEN)
                .map(char::from)
                .collect(),
        };
        SeedPair::generate(client_seed, self.config.server_seed_bytes)
    }
}
