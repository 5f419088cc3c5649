//! Streaming build pipeline: ingest → hash → sort → Rice-encode → flush,
//! sampling the sparse index as it goes (spec §4.4).
//!
//! Deduplication happens at the raw-input level (see `DESIGN.md` for why
//! bucket-level dedup after hashing would make `N = m · p` circular); two
//! distinct inputs may still collide to the same bucket, which is the
//! intended source of false positives and is handled by the Rice codec's
//! `g = 0` case.

use std::collections::BTreeSet;
use std::io::Write;

use crate::bitio::BitWriter;
use crate::error::Error;
use crate::format::{Header, HEADER_LEN};
use crate::hash::HashId;
use crate::index::SparseIndex;
use crate::preprocess::{decode_line, InputMode};
use crate::rice;

/// One anchor sampled every this many encoded gaps.
pub const DEFAULT_INDEX_LOG2_GRANULARITY: u8 = 10; // stride 1024

/// Builds a GCS file from a stream of input items.
///
/// Buffers distinct raw items in memory; memory use is O(total distinct
/// input bytes), matching the resource ceiling in spec §5
/// ("builder memory ≈ 8·m bytes for the bucket array... a straightforward
/// implementation holding m 64-bit integers in RAM is permitted").
pub struct GcsBuilder {
    hash_id: HashId,
    p: u64,
    index_log2_granularity: u8,
    items: BTreeSet<Vec<u8>>,
}

impl GcsBuilder {
    /// Start a new build. `p` is the inverse false-positive rate and must be
    /// at least 2 (spec §3); `p < 2` is rejected here rather than left to
    /// fail later as a division-by-zero or a degenerate zero-bit remainder
    /// field.
    pub fn new(hash_id: HashId, p: u64) -> Result<Self, Error> {
        if p < 2 {
            return Err(Error::InvalidParameter {
                reason: format!("p must be at least 2, got {p}"),
            });
        }
        Ok(Self {
            hash_id,
            p,
            index_log2_granularity: DEFAULT_INDEX_LOG2_GRANULARITY,
            items: BTreeSet::new(),
        })
    }

    /// Override the anchor stride (as a power-of-two exponent). Defaults to
    /// `DEFAULT_INDEX_LOG2_GRANULARITY` (1024).
    pub fn with_index_log2_granularity(mut self, log2_granularity: u8) -> Self {
        self.index_log2_granularity = log2_granularity;
        self
    }

    /// Insert one already-obtained item (no preprocessing).
    ///
    /// Duplicate inserts of the same bytes are silently absorbed (raw-level
    /// dedup, see module docs).
    pub fn insert(&mut self, item: impl Into<Vec<u8>>) {
        self.items.insert(item.into());
    }

    /// Decode one input line under `mode` and insert the resulting bytes.
    ///
    /// `line_no` (1-based) is used only to attribute a `BadInputLine` error
    /// to its source line; reading the line itself is the caller's job
    /// (spec §1 — line/file reading is an external-collaborator concern).
    pub fn ingest_line(&mut self, mode: InputMode, line: &str, line_no: u64) -> Result<(), Error> {
        let bytes = decode_line(mode, line, line_no)?;
        self.items.insert(bytes);
        Ok(())
    }

    /// Number of distinct items inserted so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hash, sort, Rice-encode, and write the complete file to `sink`.
    ///
    /// Returns the number of bytes written. Fails with `Error::Io` carrying
    /// the offset at which a write first failed (spec §4.4 failure
    /// semantics) — `sink` is only ever appended to sequentially, so that
    /// offset is always the running total of bytes written so far.
    ///
    /// Per spec §1, `n = 0` is rejected: an empty input produces no file.
    pub fn finish<W: Write>(self, mut sink: W) -> Result<u64, Error> {
        let m = self.items.len() as u64;
        if m == 0 {
            return Err(Error::BadInputLine {
                line: 0,
                reason: "cannot build a GCS filter from zero items".to_string(),
            });
        }
        let n = m
            .checked_mul(self.p)
            .ok_or(Error::OutOfMemory)?;
        let hash_id = self.hash_id;

        #[cfg(feature = "parallel")]
        use rayon::prelude::*;

        #[cfg(feature = "parallel")]
        let mut buckets: Vec<u64> = self
            .items
            .par_iter()
            .map(|item| hash_id.hash_to_bucket(item, n))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let mut buckets: Vec<u64> = self
            .items
            .iter()
            .map(|item| hash_id.hash_to_bucket(item, n))
            .collect();

        #[cfg(feature = "parallel")]
        buckets.par_sort_unstable();
        #[cfg(not(feature = "parallel"))]
        buckets.sort_unstable();

        let stride = 1u64 << self.index_log2_granularity;
        let mut index = SparseIndex::new();
        let mut writer = BitWriter::new();
        let mut prev = 0u64;
        for (i, &v) in buckets.iter().enumerate() {
            let gap = v - prev;
            rice::encode(&mut writer, gap, self.p);
            prev = v;

            let code_number = (i + 1) as u64; // 1-based, per spec §3
            if code_number % stride == 0 {
                index.push(v, writer.bit_position());
            }
        }
        let (payload, payload_bit_len) = writer.finish();

        let index_bytes = index.to_bytes();
        let payload_offset = HEADER_LEN;
        let index_offset = payload_offset + payload.len() as u64;

        let header = Header {
            hash_id: self.hash_id,
            index_log2_granularity: self.index_log2_granularity,
            n_items: m,
            p: self.p,
            n,
            payload_bit_len,
            index_entry_count: index.len() as u64,
            index_offset,
            payload_offset,
        };

        let header_bytes = header.to_bytes();
        sink.write_all(&header_bytes)
            .map_err(|e| Error::io(0, e))?;
        sink.write_all(&payload)
            .map_err(|e| Error::io(payload_offset, e))?;
        sink.write_all(&index_bytes)
            .map_err(|e| Error::io(index_offset, e))?;
        sink.flush().map_err(|e| Error::io(index_offset + index_bytes.len() as u64, e))?;

        Ok(index_offset + index_bytes.len() as u64)
    }
}
