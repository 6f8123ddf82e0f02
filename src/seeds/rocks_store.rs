//! Seed pairs persisted in RocksDB
//!
//! Rows are JSON under `seed:pair:{uuid}`. RocksDB has no row locks, so every
//! read-modify-write on a pair runs under the mutex of the stripe its id hashes
//! to; the reveal and the successor insert land in a single `WriteBatch`.

use crate::errors::{FairnessError, FairnessResult};
use crate::integrity_violation;
use crate::seeds::store::{advance_nonce, RevealOutcome, SeedStore};
use crate::seeds::types::{SeedPair, SeedPairId, SeedPairRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SEED_PAIR_PREFIX: &str = "seed:pair:";
/// Fixed lock table size; pairs sharing a stripe serialize against each other
const LOCK_STRIPES: usize = 64;

fn seed_pair_key(id: SeedPairId) -> Vec<u8> {
    format!("{}{}", SEED_PAIR_PREFIX, id).into_bytes()
}

fn encode(pair: &SeedPair) -> FairnessResult<Vec<u8>> {
    serde_json::to_vec(&SeedPairRow::from(pair)).map_err(|e| {
        FairnessError::StorageUnavailable(format!("Failed to encode seed pair {}: {}", pair.id, e))
    })
}

fn decode(id: SeedPairId, bytes: &[u8]) -> FairnessResult<SeedPair> {
    // A row that no longer parses is corrupted fairness state, not an outage
    serde_json::from_slice::<SeedPairRow>(bytes)
        .map(SeedPair::from)
        .map_err(|e| integrity_violation!("Failed to decode seed pair {}: {}", id, e))
}

#[derive(Clone)]
pub struct RocksSeedStore {
    db: Arc<DB>,
    locks: Arc<Vec<Mutex<()>>>,
}

impl RocksSeedStore {
    pub fn open<P: AsRef<Path>>(path: P) -> FairnessResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;
        Ok(Self {
            db: Arc::new(db),
            locks: Arc::new((0..LOCK_STRIPES).map(|_| Mutex::new(())).collect()),
        })
    }

    fn stripe(id: SeedPairId) -> usize {
        (id.0.as_u128() % LOCK_STRIPES as u128) as usize
    }

    fn lock_for(&self, id: SeedPairId) -> &Mutex<()> {
        &self.locks[Self::stripe(id)]
    }

    fn read(&self, id: SeedPairId) -> FairnessResult<Option<SeedPair>> {
        match self.db.get(seed_pair_key(id))? {
            Some(bytes) => decode(id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write(&self, pair: &SeedPair) -> FairnessResult<()> {
        self.db.put(seed_pair_key(pair.id), encode(pair)?)?;
        Ok(())
    }
}

#[async_trait]
impl SeedStore for RocksSeedStore {
    async fn insert(&self, pair: SeedPair) -> FairnessResult<()> {
        let _guard = self
            .lock_for(pair.id)
            .lock()
            .map_err(|_| FairnessError::StorageUnavailable("seed pair lock poisoned".to_string()))?;

        if self.read(pair.id)?.is_some() {
            return Err(integrity_violation!("seed pair {} already exists", pair.id));
        }
        self.write(&pair)
    }

    async fn load(&self, id: SeedPairId) -> FairnessResult<Option<SeedPair>> {
        self.read(id)
    }

    async fn claim_nonce(&self, id: SeedPairId) -> FairnessResult<SeedPair> {
        let _guard = self
            .lock_for(id)
            .lock()
            .map_err(|_| FairnessError::StorageUnavailable("seed pair lock poisoned".to_string()))?;

        let mut pair = self
            .read(id)?
            .ok_or_else(|| FairnessError::SeedPairNotFound(id.to_string()))?;
        let claimed = advance_nonce(&mut pair)?;
        // A failed put leaves the counter untouched and is reported, never retried
        self.write(&pair)?;
        Ok(claimed)
    }

    async fn reveal_and_replace(
        &self,
        id: SeedPairId,
        replacement: SeedPair,
        at: DateTime<Utc>,
    ) -> FairnessResult<RevealOutcome> {
        let _guard = self
            .lock_for(id)
            .lock()
            .map_err(|_| FairnessError::StorageUnavailable("seed pair lock poisoned".to_string()))?;

        let mut pair = self
            .read(id)?
            .ok_or_else(|| FairnessError::SeedPairNotFound(id.to_string()))?;

        if pair.is_revealed() {
            let successor = match pair.successor {
                Some(sid) => self.read(sid)?,
                None => None,
            };
            return Ok(RevealOutcome::AlreadyRevealed {
                revealed: pair,
                successor,
            });
        }

        pair.reveal(at)?;
        pair.successor = Some(replacement.id);

        let mut batch = WriteBatch::default();
        batch.put(seed_pair_key(pair.id), encode(&pair)?);
        batch.put(seed_pair_key(replacement.id), encode(&replacement)?);
        self.db.write(batch)?;

        Ok(RevealOutcome::Rotated {
            revealed: pair,
            next: replacement,
        })
    }

    async fn len(&self) -> FairnessResult<usize> {
        let count = self
            .db
            .prefix_iterator(SEED_PAIR_PREFIX.as_bytes())
            .map_while(|item| item.ok())
            .take_while(|(key, _)| key.starts_with(SEED_PAIR_PREFIX.as_bytes()))
            .count();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> SeedPair {
        SeedPair::generate("player1".to_string(), 32).unwrap()
    }

    #[tokio::test]
    async fn test_nonce_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let p = pair();
        let id = p.id;

        {
            let store = RocksSeedStore::open(dir.path()).unwrap();
            store.insert(p).await.unwrap();
            assert_eq!(store.claim_nonce(id).await.unwrap().nonce, 0);
            assert_eq!(store.claim_nonce(id).await.unwrap().nonce, 1);
        }

        let store = RocksSeedStore::open(dir.path()).unwrap();
        assert_eq!(store.claim_nonce(id).await.unwrap().nonce, 2);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[test]
    fn test_lock_table_does_not_grow() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksSeedStore::open(dir.path()).unwrap();

        let ids: Vec<SeedPairId> = (0..1_000).map(|_| SeedPairId::new()).collect();
        for id in &ids {
            let stripe = RocksSeedStore::stripe(*id);
            assert!(stripe < LOCK_STRIPES);
            assert_eq!(stripe, RocksSeedStore::stripe(*id));
            assert!(std::ptr::eq(store.lock_for(*id), &store.locks[stripe]));
        }
        assert_eq!(store.locks.len(), LOCK_STRIPES);

        let first = ids[0];
        assert!(std::ptr::eq(store.lock_for(first), store.clone().lock_for(first)));
    }

    #[tokio::test]
    async fn test_rotated_pairs_leave_no_lock_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksSeedStore::open(dir.path()).unwrap();

        let mut current = pair();
        store.insert(current.clone()).await.unwrap();
        for _ in 0..200 {
            store.claim_nonce(current.id).await.unwrap();
            let next = pair();
            store.reveal_and_replace(current.id, next.clone(), Utc::now()).await.unwrap();
            current = next;
        }
        assert_eq!(store.len().await.unwrap(), 201);
        assert_eq!(store.locks.len(), LOCK_STRIPES);
    }

    #[tokio::test]
    async fn test_reveal_is_persisted_with_successor() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksSeedStore::open(dir.path()).unwrap();
        let p = pair();
        let id = p.id;
        store.insert(p).await.unwrap();

        let next = pair();
        let next_id = next.id;
        store.reveal_and_replace(id, next, Utc::now()).await.unwrap();

        let stored = store.load(id).await.unwrap().unwrap();
        assert!(stored.is_revealed());
        assert_eq!(stored.successor, Some(next_id));
        assert!(stored.check_commitment().is_ok());
        assert!(store.load(next_id).await.unwrap().is_some());
        assert!(matches!(
            store.claim_nonce(id).await,
            Err(FairnessError::IntegrityViolation(_))
        ));

        match store.reveal_and_replace(id, pair(), Utc::now()).await.unwrap() {
            RevealOutcome::AlreadyRevealed { successor, .. } => {
                assert_eq!(successor.map(|s| s.id), Some(next_id));
            }
            other => panic!("Expected existing reveal, got {:?}", other),
        }
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
