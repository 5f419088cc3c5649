//! Hashing of arbitrary byte strings down to a bucket in `[0, N)`.
//!
//! The hash identity used at build time is frozen into the file header
//! (`format::Header::hash_id`) so that a query against a file built with a
//! different hash can never silently produce wrong answers — see
//! `Error::UnsupportedHash`.

use std::hash::Hasher as _;

use sha1::{Digest, Sha1};
use siphasher::sip::SipHasher24;

use crate::error::Error;

/// Which 64-bit hash a file's buckets were derived with.
///
/// Recorded as a single byte in the file header (`hash_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashId {
    /// SHA-1, truncated to its first 8 bytes, read big-endian.
    Sha1Trunc64 = 0,
    /// SipHash-2-4 with an all-zero 128-bit key.
    SipHash24 = 1,
}

impl HashId {
    /// Raw byte stored in the header for this hash identity.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Recover a `HashId` from a header byte, or `UnsupportedHash`.
    pub fn from_byte(b: u8) -> Result<Self, Error> {
        match b {
            0 => Ok(HashId::Sha1Trunc64),
            1 => Ok(HashId::SipHash24),
            other => Err(Error::UnsupportedHash { id: other }),
        }
    }

    /// Hash `item` to a uniform 64-bit integer using this identity.
    fn hash64(self, item: &[u8]) -> u64 {
        match self {
            HashId::Sha1Trunc64 => {
                let digest = Sha1::digest(item);
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&digest[0..8]);
                u64::from_be_bytes(buf)
            }
            HashId::SipHash24 => {
                // A fixed, all-zero key is sufficient here: the contract
                // only requires uniformity, not unpredictability against an
                // adversary who can also read the file format (spec §4.1).
                let mut hasher = SipHasher24::new_with_keys(0, 0);
                hasher.write(item);
                hasher.finish()
            }
        }
    }

    /// Hash `item` and reduce it to a bucket in `[0, n)`.
    ///
    /// `n` is the bucket universe size `N = m · p` (spec §3); callers must
    /// never pass `n == 0`.
    pub fn hash_to_bucket(self, item: &[u8], n: u64) -> u64 {
        debug_assert!(n > 0, "bucket universe size must be positive");
        self.hash64(item) % n
    }
}
