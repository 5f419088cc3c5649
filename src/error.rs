//! Error kinds for Golomb Compressed Set construction and loading.
//!
//! One `thiserror` enum, one paired `Result` alias — mirrors the error
//! module shape used throughout this project's protocol modules.

use thiserror::Error;

/// Errors raised while building or opening a GCS file.
///
/// `GcsFilter::contains` never returns an `Error`: once a file is open,
/// membership queries are a total function over byte strings (spec §7).
#[derive(Error, Debug)]
pub enum Error {
    /// A line failed input preprocessing (malformed hex, typically).
    #[error("bad input at line {line}: {reason}")]
    BadInputLine {
        /// 1-based line number within the input stream.
        line: u64,
        /// Human-readable reason the line was rejected.
        reason: String,
    },

    /// A read, write, or seek failed.
    #[error("I/O failure at offset {offset}: {source}")]
    Io {
        /// Byte offset at which the failure occurred, if known (0 otherwise).
        offset: u64,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file does not begin with the expected magic bytes.
    #[error("bad magic: expected \"GCS1\", found {found:?}")]
    BadMagic {
        /// The 4 bytes actually found at the start of the file.
        found: [u8; 4],
    },

    /// The header names a hash identity this build does not recognize.
    #[error("unsupported hash identity: {id}")]
    UnsupportedHash {
        /// The raw `hash_id` byte from the header.
        id: u8,
    },

    /// The payload or index is shorter than the header implies.
    #[error("truncated file: expected at least {expected} bytes, found {actual}")]
    Truncated {
        /// Minimum byte length implied by the header.
        expected: u64,
        /// Actual byte length available.
        actual: u64,
    },

    /// The sparse index violates one of its consistency invariants.
    #[error("inconsistent index: {reason}")]
    InconsistentIndex {
        /// Which invariant was violated.
        reason: String,
    },

    /// The builder could not allocate room for the bucket array.
    #[error("out of memory building filter")]
    OutOfMemory,

    /// A build parameter outside the data model's contract (`p >= 2`).
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Which parameter was rejected and why.
        reason: String,
    },
}

impl Error {
    pub(crate) fn io(offset: u64, source: std::io::Error) -> Error {
        Error::Io { offset, source }
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
