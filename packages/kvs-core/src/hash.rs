//! Keyed hashing of cache keys to the internal fingerprint type `H`.
//!
//! Uses HighwayHash-64 seeded with a 32-byte nonce that is generated once per
//! process and held for the process's lifetime. The nonce is *not* a security
//! boundary: it exists only to avoid pathological hash collisions across
//! restarts, not to make the hash resistant to an adversary who can already
//! submit arbitrary keys. See the module-level note in `store.rs`.

use highway::{HighwayHash, HighwayHasher, Key};

/// The fingerprint type used everywhere a key is looked up or routed: a
/// partition index, a dictionary bucket, a `Record` identity.
pub type Fingerprint = u64;

/// Holds the process-lifetime nonce and computes fingerprints from raw key
/// bytes.
#[derive(Clone)]
pub struct KeyHasher {
    key: Key,
}

impl KeyHasher {
    /// Builds a hasher from a caller-supplied 32-byte nonce.
    #[must_use]
    pub fn with_nonce(nonce: [u8; 32]) -> Self {
        Self {
            key: nonce_to_key(nonce),
        }
    }

    /// Builds a hasher with the all-zero nonce, matching the default the
    /// original service shipped with.
    #[must_use]
    pub fn zero_nonce() -> Self {
        Self::with_nonce([0u8; 32])
    }

    /// Fingerprints a key's raw bytes.
    #[must_use]
    pub fn hash(&self, key_bytes: &[u8]) -> Fingerprint {
        HighwayHasher::new(self.key).hash64(key_bytes)
    }
}

fn nonce_to_key(nonce: [u8; 32]) -> Key {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(nonce.chunks_exact(8)) {
        *word = u64::from_le_bytes(chunk.try_into().expect("chunk is exactly 8 bytes"));
    }
    Key(words)
}
