//! Seed commitment lifecycle: creation, nonce advancement, rotation and reveal.

pub mod manager;
#[cfg(feature = "rocksdb")]
pub mod rocks_store;
pub mod store;
pub mod types;

pub use manager::SeedManager;
#[cfg(feature = "rocksdb")]
pub use rocks_store::RocksSeedStore;
pub use store::{MemorySeedStore, RevealOutcome, SeedStore};
pub use types::{
    Rotation, RotationResponse, SeedCommitment, SeedPair, SeedPairId, SeedState, ServerSeed,
};
