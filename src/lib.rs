//! fairroll - provably fair outcome engine
//!
//! Commit-reveal seed pairs, HMAC-SHA256 randomness extraction and
//! deterministic game outcomes that anyone can recompute once the server seed
//! is revealed.

pub mod config;
pub mod errors;
pub mod extractor;
pub mod games;
pub mod metrics;
pub mod seeds;
pub mod service;
pub mod verifier;

pub use config::{ConfigLoader, EngineConfig};
pub use errors::{FairnessError, FairnessResult};
pub use games::{CoinSide, FairnessProof, GameParams, GameResult, GameType, OutcomeEngine, RoundOutcome};
pub use seeds::{MemorySeedStore, SeedCommitment, SeedManager, SeedPair, SeedPairId, SeedStore};
pub use service::{BetReceipt, FairnessEngine};
pub use verifier::{verify_commitment, FairnessVerifier, Verification, VerifyRequest, VerifyResponse};
