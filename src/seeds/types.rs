use crate::errors::{FairnessError, FairnessResult};
use crate::extractor::sha256_hex;
use crate::integrity_violation;
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Longest client seed accepted from a player
pub const MAX_CLIENT_SEED_LEN: usize = 64;

/// Seed pair identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SeedPairId(pub Uuid);

impl SeedPairId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeedPairId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeedPairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SeedPairId {
    type Err = FairnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| FairnessError::InvalidParameters(format!("Invalid seed pair id '{}': {}", s, e)))
    }
}

/// Hex-encoded server secret
///
/// `Debug` is redacted and there is no serde impl, so the plaintext only
/// leaves the crate through a reveal.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed(String);

impl ServerSeed {
    /// Fresh secret from the OS CSPRNG; no fallback source is ever used
    pub fn generate(byte_len: usize) -> FairnessResult<Self> {
        let mut bytes = vec![0u8; byte_len];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The published commitment: hex SHA-256 of the seed string
    pub fn commitment(&self) -> String {
        sha256_hex(self.0.as_bytes())
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

/// One-way reveal state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SeedState {
    Unrevealed,
    Revealed { at: DateTime<Utc> },
}

/// The unit of commitment
///
/// Not serializable: stores persist it through `SeedPairRow`, and the public
/// wire shape is `SeedCommitment`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPair {
    pub id: SeedPairId,
    server_seed: ServerSeed,
    pub server_seed_hash: String,
    pub client_seed: String,
    /// Next nonce to hand out
    pub nonce: u64,
    pub state: SeedState,
    pub created_at: DateTime<Utc>,
    /// Pair created by the rotation that revealed this one
    pub successor: Option<SeedPairId>,
}

/// Storage encoding of a pair, secret included; never handed to callers
#[cfg(any(feature = "rocksdb", test))]
#[derive(Serialize, Deserialize)]
pub(crate) struct SeedPairRow {
    id: SeedPairId,
    server_seed: String,
    server_seed_hash: String,
    client_seed: String,
    nonce: u64,
    state: SeedState,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    successor: Option<SeedPairId>,
}

#[cfg(any(feature = "rocksdb", test))]
impl From<&SeedPair> for SeedPairRow {
    fn from(pair: &SeedPair) -> Self {
        Self {
            id: pair.id,
            server_seed: pair.server_seed.0.clone(),
            server_seed_hash: pair.server_seed_hash.clone(),
            client_seed: pair.client_seed.clone(),
            nonce: pair.nonce,
            state: pair.state,
            created_at: pair.created_at,
            successor: pair.successor,
        }
    }
}

#[cfg(any(feature = "rocksdb", test))]
impl From<SeedPairRow> for SeedPair {
    fn from(row: SeedPairRow) -> Self {
        Self {
            id: row.id,
            server_seed: ServerSeed(row.server_seed),
            server_seed_hash: row.server_seed_hash,
            client_seed: row.client_seed,
            nonce: row.nonce,
            state: row.state,
            created_at: row.created_at,
            successor: row.successor,
        }
    }
}

impl SeedPair {
    /// Commit to a fresh server seed
    pub fn generate(client_seed: String, seed_bytes: usize) -> FairnessResult<Self> {
        validate_client_seed(&client_seed)?;
        let server_seed = ServerSeed::generate(seed_bytes)?;
        let server_seed_hash = server_seed.commitment();
        Ok(Self {
            id: SeedPairId::new(),
            server_seed,
            server_seed_hash,
            client_seed,
            nonce: 0,
            state: SeedState::Unrevealed,
            created_at: Utc::now(),
            successor: None,
        })
    }

    /// Build a pair around a known secret (fixtures, imports)
    pub fn from_parts(server_seed: String, client_seed: String) -> FairnessResult<Self> {
        validate_client_seed(&client_seed)?;
        let server_seed = ServerSeed(server_seed);
        let server_seed_hash = server_seed.commitment();
        Ok(Self {
            id: SeedPairId::new(),
            server_seed,
            server_seed_hash,
            client_seed,
            nonce: 0,
            state: SeedState::Unrevealed,
            created_at: Utc::now(),
            successor: None,
        })
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, SeedState::Revealed { .. })
    }

    pub fn revealed_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            SeedState::Revealed { at } => Some(at),
            SeedState::Unrevealed => None,
        }
    }

    /// Plaintext secret, available only once revealed
    pub fn revealed_server_seed(&self) -> Option<&str> {
        self.is_revealed().then(|| self.server_seed.as_str())
    }

    /// Secret for outcome derivation inside the engine
    pub(crate) fn server_seed(&self) -> &ServerSeed {
        &self.server_seed
    }

    /// Unrevealed -> Revealed; a second reveal is an ordering violation
    pub(crate) fn reveal(&mut self, at: DateTime<Utc>) -> FairnessResult<()> {
        if let SeedState::Revealed { at: previous } = self.state {
            return Err(integrity_violation!(
                "seed pair {} already revealed at {}",
                self.id,
                previous
            ));
        }
        self.state = SeedState::Revealed { at };
        Ok(())
    }

    /// Commitment still matches the secret
    pub fn check_commitment(&self) -> FairnessResult<()> {
        if self.server_seed.commitment() != self.server_seed_hash {
            return Err(integrity_violation!("commitment mismatch on seed pair {}", self.id));
        }
        Ok(())
    }

    pub fn commitment(&self) -> SeedCommitment {
        SeedCommitment {
            id: self.id,
            server_seed_hash: self.server_seed_hash.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            revealed_server_seed: self.revealed_server_seed().map(str::to_string),
            revealed_at: self.revealed_at(),
        }
    }
}

pub fn validate_client_seed(client_seed: &str) -> FairnessResult<()> {
    if client_seed.is_empty() {
        return Err(FairnessError::InvalidParameters("client seed cannot be empty".to_string()));
    }
    if client_seed.len() > MAX_CLIENT_SEED_LEN {
        return Err(FairnessError::InvalidParameters(format!(
            "client seed is {} bytes (max {})",
            client_seed.len(),
            MAX_CLIENT_SEED_LEN
        )));
    }
    Ok(())
}

/// Public view of a seed pair; carries the secret only after reveal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedCommitment {
    pub id: SeedPairId,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_server_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_at: Option<DateTime<Utc>>,
}

/// Result of a rotation: the revealed pair and its replacement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rotation {
    pub revealed: SeedCommitment,
    pub next: SeedCommitment,
    /// False when the pair had already been rotated and this call changed nothing
    pub rotated: bool,
}

/// Wire shape of the seed rotation surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RotationResponse {
    pub revealed_server_seed: String,
    pub revealed_server_seed_hash: String,
    pub new_seed_pair_id: SeedPairId,
    pub new_server_seed_hash: String,
    pub new_client_seed: String,
}

impl Rotation {
    pub fn to_response(&self) -> FairnessResult<RotationResponse> {
        let revealed_server_seed = self.revealed.revealed_server_seed.clone().ok_or_else(|| {
            integrity_violation!("rotation of {} produced no revealed seed", self.revealed.id)
        })?;
        Ok(RotationResponse {
            revealed_server_seed,
            revealed_server_seed_hash: self.revealed.server_seed_hash.clone(),
            new_seed_pair_id: self.next.id,
            new_server_seed_hash: self.next.server_seed_hash.clone(),
            new_client_seed: self.next.client_seed.clone(),
        })
    }
}
