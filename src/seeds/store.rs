//! Seed-pair persistence
//!
//! The store owns the only shared mutable state in the engine: each pair's
//! nonce counter and its reveal flag. Implementations must make
//! `claim_nonce` a single read-increment per pair and must apply the reveal
//! together with the insertion of the successor.

use crate::errors::{FairnessError, FairnessResult};
use crate::integrity_violation;
use crate::seeds::types::{SeedPair, SeedPairId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Outcome of a reveal request at the store level
#[derive(Debug, Clone)]
pub enum RevealOutcome {
    /// The pair was revealed by this call and `next` was stored
    Rotated { revealed: SeedPair, next: SeedPair },
    /// The pair was revealed earlier; the offered replacement was discarded
    AlreadyRevealed {
        revealed: SeedPair,
        successor: Option<SeedPair>,
    },
}

/// Keyed record store for seed pairs
#[async_trait]
pub trait SeedStore: Send + Sync {
    /// Store a freshly generated pair; ids are never reused
    async fn insert(&self, pair: SeedPair) -> FairnessResult<()>;

    async fn load(&self, id: SeedPairId) -> FairnessResult<Option<SeedPair>>;

    /// Atomically hand out the next nonce
    ///
    /// Returns the pair as it stood before the increment, so `nonce` on the
    /// returned value is the claimed nonce. Fails on revealed pairs.
    async fn claim_nonce(&self, id: SeedPairId) -> FairnessResult<SeedPair>;

    /// Reveal `id` and store `replacement` as its successor in one step
    async fn reveal_and_replace(
        &self,
        id: SeedPairId,
        replacement: SeedPair,
        at: DateTime<Utc>,
    ) -> FairnessResult<RevealOutcome>;

    /// Number of stored pairs
    async fn len(&self) -> FairnessResult<usize>;
}

/// Nonce advance shared by store implementations
pub(crate) fn advance_nonce(pair: &mut SeedPair) -> FairnessResult<SeedPair> {
    if pair.is_revealed() {
        return Err(integrity_violation!(
            "seed pair {} is revealed; nonce {} cannot be consumed",
            pair.id,
            pair.nonce
        ));
    }
    let claimed = pair.clone();
    pair.nonce = pair
        .nonce
        .checked_add(1)
        .ok_or_else(|| integrity_violation!("nonce space exhausted on seed pair {}", pair.id))?;
    Ok(claimed)
}

/// In-process store; each map shard lock serializes its pairs
#[derive(Clone, Default)]
pub struct MemorySeedStore {
    pairs: Arc<DashMap<SeedPairId, SeedPair>>,
}

impl MemorySeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeedStore for MemorySeedStore {
    async fn insert(&self, pair: SeedPair) -> FairnessResult<()> {
        if self.pairs.contains_key(&pair.id) {
            return Err(integrity_violation!("seed pair {} already exists", pair.id));
        }
        self.pairs.insert(pair.id, pair);
        Ok(())
    }

    async fn load(&self, id: SeedPairId) -> FairnessResult<Option<SeedPair>> {
        Ok(self.pairs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn claim_nonce(&self, id: SeedPairId) -> FairnessResult<SeedPair> {
        let mut entry = self
            .pairs
            .get_mut(&id)
            .ok_or_else(|| FairnessError::SeedPairNotFound(id.to_string()))?;
        advance_nonce(entry.value_mut())
    }

    async fn reveal_and_replace(
        &self,
        id: SeedPairId,
        replacement: SeedPair,
        at: DateTime<Utc>,
    ) -> FairnessResult<RevealOutcome> {
        // Insert first: no guard may be held while touching another shard
        let next_id = replacement.id;
        self.pairs.insert(next_id, replacement);

        let (was_revealed, pair) = {
            let Some(mut entry) = self.pairs.get_mut(&id) else {
                drop(self.pairs.remove(&next_id));
                return Err(FairnessError::SeedPairNotFound(id.to_string()));
            };
            let pair = entry.value_mut();
            let was_revealed = pair.is_revealed();
            if !was_revealed {
                pair.reveal(at)?;
                pair.successor = Some(next_id);
            }
            (was_revealed, pair.clone())
        };

        if was_revealed {
            self.pairs.remove(&next_id);
            let successor = pair
                .successor
                .and_then(|sid| self.pairs.get(&sid).map(|entry| entry.value().clone()));
            return Ok(RevealOutcome::AlreadyRevealed {
                revealed: pair,
                successor,
            });
        }

        let next = self
            .pairs
            .get(&next_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| integrity_violation!("successor {} vanished", next_id))?;
        Ok(RevealOutcome::Rotated { revealed: pair, next })
    }

    async fn len(&self) -> FairnessResult<usize> {
        Ok(self.pairs.len())
    }
}
