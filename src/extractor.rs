//! Random byte extraction
//!
//! server_seed + client_seed + nonce + cursor -> HMAC-SHA256 -> 32-byte digest.
//! Integers come from the first four digest bytes (big-endian) with rejection
//! sampling; a rejected word advances the cursor and recombines, so no state
//! beyond the seed triple is ever needed to reproduce a draw.

use crate::errors::{FairnessError, FairnessResult};
use crate::integrity_violation;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

pub type HmacSha256 = Hmac<Sha256>;

/// Raw HMAC output for one `(nonce, cursor)` position
pub type CombinedDigest = [u8; 32];

const TWO_POW_32: u64 = 1 << 32;
const MAX_DRAW_ATTEMPTS: u32 = 1024;

/// Added before flooring so exact decimals like 0.98 / 0.5 survive binary rounding
const FLOOR_EPSILON: f64 = 1e-9;

/// HMAC-SHA256 keyed by the client seed over `"{server}:{client}:{nonce}:{cursor}"`
pub fn combine(server_seed: &str, client_seed: &str, nonce: u64, cursor: u32) -> CombinedDigest {
    // HMAC accepts keys of any length, including empty
    let mut mac = HmacSha256::new_from_slice(client_seed.as_bytes())
        .expect("HMAC accepts keys of any length");
    let message = format!("{}:{}:{}:{}", server_seed, client_seed, nonce, cursor);
    mac.update(message.as_bytes());
    mac.finalize().into_bytes().into()
}

/// Lowercase hex SHA-256, used for server seed commitments
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// First four digest bytes as a big-endian word
pub fn leading_word(digest: &CombinedDigest) -> u32 {
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Reduce `word` into `[0, bound)` unless it falls in the biased tail
pub fn accept_word(word: u32, bound: u32) -> Option<u32> {
    let limit = (TWO_POW_32 / bound as u64) * bound as u64;
    if (word as u64) < limit {
        Some(word % bound)
    } else {
        None
    }
}

/// Uniform float in `[0, 1)` from the leading word
pub fn uniform_float(digest: &CombinedDigest) -> f64 {
    leading_word(digest) as f64 / TWO_POW_32 as f64
}

/// Truncate `value` to `places` decimals
pub fn floor_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale + FLOOR_EPSILON).floor() / scale
}

/// One accepted draw and the digest it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub value: u32,
    pub word: u32,
    pub cursor: u32,
    pub digest: CombinedDigest,
}

impl Draw {
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Deterministic draw sequence for one round
///
/// Each draw starts at the current cursor and leaves the cursor one past the
/// position it was accepted at.
#[derive(Debug, Clone)]
pub struct RoundRng<'a> {
    server_seed: &'a str,
    client_seed: &'a str,
    nonce: u64,
    cursor: u32,
}

impl<'a> RoundRng<'a> {
    pub fn new(server_seed: &'a str, client_seed: &'a str, nonce: u64, cursor: u32) -> Self {
        Self {
            server_seed,
            client_seed,
            nonce,
            cursor,
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Digest at the current cursor, then advance
    pub fn next_digest(&mut self) -> FairnessResult<(u32, CombinedDigest)> {
        let cursor = self.cursor;
        let digest = combine(self.server_seed, self.client_seed, self.nonce, cursor);
        self.cursor = cursor
            .checked_add(1)
            .ok_or_else(|| integrity_violation!("cursor overflow at nonce {}", self.nonce))?;
        Ok((cursor, digest))
    }

    /// Uniform integer in `[0, bound)` by rejection sampling
    pub fn uniform_int(&mut self, bound: u32) -> FairnessResult<Draw> {
        if bound == 0 {
            return Err(FairnessError::InvalidParameters(
                "uniform_int bound must be positive".to_string(),
            ));
        }

        for _ in 0..MAX_DRAW_ATTEMPTS {
            let (cursor, digest) = self.next_digest()?;
            let word = leading_word(&digest);
            if let Some(value) = accept_word(word, bound) {
                return Ok(Draw {
                    value,
                    word,
                    cursor,
                    digest,
                });
            }
            tracing::debug!(nonce = self.nonce, cursor, bound, "rejected biased word");
        }

        Err(integrity_violation!(
            "rejection sampling exhausted after {} attempts at nonce {}",
            MAX_DRAW_ATTEMPTS,
            self.nonce
        ))
    }

    /// Uniform float in `[0, 1)`; the returned draw carries the raw word
    pub fn uniform_float(&mut self) -> FairnessResult<(f64, Draw)> {
        let (cursor, digest) = self.next_digest()?;
        let word = leading_word(&digest);
        let draw = Draw {
            value: word,
            word,
            cursor,
            digest,
        };
        Ok((uniform_float(&digest), draw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER: &str = "abcdefghijklmnopqrstuvwxyz012345";
    const CLIENT: &str = "player1";

    #[test]
    fn test_combine_regression_vector() {
        let digest = combine(SERVER, CLIENT, 0, 0);
        assert_eq!(
            hex::encode(digest),
            "0bb1279eb53e29b943a17e58977fc7ceab166aebdcc25463ba72e4a1ee8c81fe"
        );
        assert_eq!(leading_word(&digest), 196_159_390);
    }

    #[test]
    fn test_combine_is_position_sensitive() {
        let base = combine(SERVER, CLIENT, 0, 0);
        assert_ne!(base, combine(SERVER, CLIENT, 1, 0));
        assert_ne!(base, combine(SERVER, CLIENT, 0, 1));
        assert_ne!(base, combine(SERVER, "player2", 0, 0));
        assert_ne!(base, combine("abcdefghijklmnopqrstuvwxyz012346", CLIENT, 0, 0));
    }

    #[test]
    fn test_server_seed_commitment_hash() {
        assert_eq!(
            sha256_hex(SERVER.as_bytes()),
            "653bb1245e828fcda4fa53fcd5a3def5bd7654e651f54b4132b73d74e64435c4"
        );
    }

    #[test]
    fn test_accept_word_rejects_biased_tail() {
        // 2^32 = 42_949_672 * 100 + 96, so the top 96 words are rejected
        assert_eq!(accept_word(4_294_967_199, 100), Some(99));
        assert_eq!(accept_word(4_294_967_200, 100), None);
        assert_eq!(accept_word(u32::MAX, 100), None);
        assert_eq!(accept_word(0, 100), Some(0));
        // Powers of two divide the range evenly
        assert_eq!(accept_word(u32::MAX, 64), Some(63));
    }

    #[test]
    fn test_uniform_int_advances_cursor() {
        let mut rng = RoundRng::new(SERVER, CLIENT, 0, 0);
        let first = rng.uniform_int(100).unwrap();
        assert_eq!(first.value, 90);
        assert_eq!(first.cursor, 0);
        assert_eq!(rng.cursor(), 1);

        let second = rng.uniform_int(100).unwrap();
        assert_eq!(second.cursor, 1);
        assert_eq!(second.digest, combine(SERVER, CLIENT, 0, 1));
    }

    #[test]
    fn test_zero_bound_is_invalid() {
        let mut rng = RoundRng::new(SERVER, CLIENT, 0, 0);
        assert!(matches!(
            rng.uniform_int(0),
            Err(FairnessError::InvalidParameters(_))
        ));
        // Nothing was consumed
        assert_eq!(rng.cursor(), 0);
    }

    #[test]
    fn test_uniform_float_range() {
        assert_eq!(uniform_float(&[0u8; 32]), 0.0);
        let top = uniform_float(&[0xff; 32]);
        assert!(top < 1.0 && top > 0.999_999);
    }

    #[test]
    fn test_cursor_overflow_is_reported() {
        let mut rng = RoundRng::new(SERVER, CLIENT, 0, u32::MAX);
        assert!(matches!(
            rng.next_digest(),
            Err(FairnessError::IntegrityViolation(_))
        ));
    }

    #[test]
    fn test_floor_to() {
        assert_eq!(floor_to(0.98 / 0.5, 4), 1.96);
        assert_eq!(floor_to(0.97 / 0.49, 4), 1.9795);
        assert_eq!(floor_to(77.856_786, 2), 77.85);
        assert_eq!(floor_to(2.0, 2), 2.0);
    }
}
