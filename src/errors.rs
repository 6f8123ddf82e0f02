//! Error taxonomy for the fairness engine
//!
//! Integrity violations and entropy failures are fatal to the operation that
//! raised them. Only storage outages are reported as retryable, and nothing in
//! this crate retries on its own.

use thiserror::Error;

/// Root error type for all engine operations
#[derive(Debug, Error)]
pub enum FairnessError {
    /// Nonce reuse, commitment mismatch or an out-of-order reveal
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Game or seed parameters outside their declared range
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The operating system's secure random source failed
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),

    /// Seed-pair persistence layer is down or returned an I/O error
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Seed pair {0} not found")]
    SeedPairNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FairnessError {
    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, FairnessError::StorageUnavailable(_))
    }

    /// Short machine-readable code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            FairnessError::IntegrityViolation(_) => "INTEGRITY_VIOLATION",
            FairnessError::InvalidParameters(_) => "INVALID_PARAMETERS",
            FairnessError::EntropyUnavailable(_) => "ENTROPY_UNAVAILABLE",
            FairnessError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            FairnessError::SeedPairNotFound(_) => "NOT_FOUND",
            FairnessError::Configuration(_) => "CONFIGURATION",
        }
    }
}

// External error conversions
impl From<rand_core::Error> for FairnessError {
    fn from(e: rand_core::Error) -> Self {
        FairnessError::EntropyUnavailable(e.to_string())
    }
}

impl From<toml::de::Error> for FairnessError {
    fn from(e: toml::de::Error) -> Self {
        FairnessError::Configuration(format!("Failed to parse TOML: {}", e))
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for FairnessError {
    fn from(e: rocksdb::Error) -> Self {
        FairnessError::StorageUnavailable(e.to_string())
    }
}

// Convenience type alias for Results
pub type FairnessResult<T> = Result<T, FairnessError>;

/// Build an integrity violation with formatted context
#[macro_export]
macro_rules! integrity_violation {
    ($fmt:expr) => {
        $crate::errors::FairnessError::IntegrityViolation($fmt.to_string())
    };
    ($fmt:expr, $($args:tt)*) => {
        $crate::errors::FairnessError::IntegrityViolation(format!($fmt, $($args)*))
    };
}
