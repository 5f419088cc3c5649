//! Sparse positional index: a fixed-stride table of
//! `(cumulative_value, bit_offset)` anchors enabling O(log A) random access
//! into the Rice-coded payload (spec §4.5).

use crate::error::Error;

/// One entry of the sparse index.
///
/// `anchor_value` is the running sum of gaps (== a bucket value) immediately
/// after encoding `bit_offset`'s code; `bit_offset` is the position in the
/// payload bitstream right after that code's terminating bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub anchor_value: u64,
    pub anchor_bit_offset: u64,
}

/// The full sparse index for one file, in ascending order of both fields.
///
/// The implicit anchor `(0, 0)` (spec §3, §4.7) is never stored here; it is
/// synthesized by callers when a probe falls before the first real anchor.
#[derive(Debug, Clone, Default)]
pub struct SparseIndex {
    anchors: Vec<Anchor>,
}

impl SparseIndex {
    /// An index with no anchors (only the implicit `(0, 0)` applies).
    pub fn new() -> Self {
        Self {
            anchors: Vec::new(),
        }
    }

    /// Append an anchor. Callers must push in ascending order of both
    /// fields (the builder does this by construction, one per
    /// `index_granularity` codes).
    pub fn push(&mut self, anchor_value: u64, anchor_bit_offset: u64) {
        self.anchors.push(Anchor {
            anchor_value,
            anchor_bit_offset,
        });
    }

    /// Number of stored (non-implicit) anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// All stored anchors, in ascending order of both fields.
    pub fn as_slice(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Find the largest anchor with `anchor_value <= target`, or the
    /// implicit `(0, 0)` if `target` precedes every stored anchor
    /// (spec §4.7 step 2).
    pub fn floor(&self, target: u64) -> Anchor {
        // partition_point finds the first index where anchor_value > target;
        // the anchor just before it is the floor.
        let idx = self.anchors.partition_point(|a| a.anchor_value <= target);
        if idx == 0 {
            Anchor {
                anchor_value: 0,
                anchor_bit_offset: 0,
            }
        } else {
            self.anchors[idx - 1]
        }
    }

    /// Serialize as repeated little-endian `(u64, u64)` pairs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.anchors.len() * 16);
        for a in &self.anchors {
            out.extend_from_slice(&a.anchor_value.to_le_bytes());
            out.extend_from_slice(&a.anchor_bit_offset.to_le_bytes());
        }
        out
    }

    /// Parse `count` `(u64, u64)` pairs from `data`, validating monotonicity
    /// of both fields (spec §4.5 contract).
    pub fn from_bytes(data: &[u8], count: u64) -> Result<Self, Error> {
        let need = count
            .checked_mul(16)
            .ok_or(Error::InconsistentIndex {
                reason: "index entry count overflows byte length".to_string(),
            })?;
        if (data.len() as u64) < need {
            return Err(Error::Truncated {
                expected: need,
                actual: data.len() as u64,
            });
        }

        let mut anchors = Vec::with_capacity(count as usize);
        let mut prev: Option<Anchor> = None;
        for i in 0..count as usize {
            let base = i * 16;
            let anchor_value = u64::from_le_bytes(data[base..base + 8].try_into().unwrap());
            let anchor_bit_offset =
                u64::from_le_bytes(data[base + 8..base + 16].try_into().unwrap());
            let anchor = Anchor {
                anchor_value,
                anchor_bit_offset,
            };
            if let Some(p) = prev {
                if anchor.anchor_value < p.anchor_value
                    || anchor.anchor_bit_offset <= p.anchor_bit_offset
                {
                    return Err(Error::InconsistentIndex {
                        reason: format!(
                            "anchor {i} is not strictly greater than the previous anchor"
                        ),
                    });
                }
            }
            anchors.push(anchor);
            prev = Some(anchor);
        }
        Ok(Self { anchors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_before_first_anchor_is_implicit() {
        let mut idx = SparseIndex::new();
        idx.push(100, 800);
        let a = idx.floor(50);
        assert_eq!(a.anchor_value, 0);
        assert_eq!(a.anchor_bit_offset, 0);
    }

    #[test]
    fn floor_picks_largest_not_exceeding_target() {
        let mut idx = SparseIndex::new();
        idx.push(100, 800);
        idx.push(250, 2000);
        idx.push(400, 3500);

        assert_eq!(idx.floor(100).anchor_value, 100);
        assert_eq!(idx.floor(249).anchor_value, 100);
        assert_eq!(idx.floor(250).anchor_value, 250);
        assert_eq!(idx.floor(999).anchor_value, 400);
    }

    #[test]
    fn roundtrip_bytes() {
        let mut idx = SparseIndex::new();
        idx.push(10, 20);
        idx.push(30, 50);
        let bytes = idx.to_bytes();
        let back = SparseIndex::from_bytes(&bytes, 2).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.floor(30).anchor_value, 30);
    }

    #[test]
    fn rejects_non_monotone_anchors() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u64.to_le_bytes());
        bytes.extend_from_slice(&200u64.to_le_bytes());
        bytes.extend_from_slice(&50u64.to_le_bytes()); // value goes backwards
        bytes.extend_from_slice(&400u64.to_le_bytes());
        assert!(SparseIndex::from_bytes(&bytes, 2).is_err());
    }

    #[test]
    fn rejects_truncated_index() {
        let bytes = vec![0u8; 10];
        assert!(SparseIndex::from_bytes(&bytes, 1).is_err());
    }
}
