//! File header: magic, parameters, section offsets (spec §6, bit-exact).
//!
//! ```text
//! offset  size  field
//! ------  ----  -----
//! 0       4     magic = "GCS1"
//! 4       1     hash_id
//! 5       1     index_log2_granularity
//! 6       2     reserved (zero)
//! 8       8     n_items
//! 16      8     p
//! 24      8     N
//! 32      8     payload_bit_len
//! 40      8     index_entry_count
//! 48      8     index_offset
//! 56      8     payload_offset
//! 64      ...   payload bytes
//! ...     ...   index bytes
//! ```

use crate::error::Error;
use crate::hash::HashId;

/// Fixed size of the header, and thus the default `payload_offset`.
pub const HEADER_LEN: u64 = 64;

/// Magic bytes identifying a GCS file.
pub const MAGIC: [u8; 4] = *b"GCS1";

/// Parsed file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub hash_id: HashId,
    pub index_log2_granularity: u8,
    pub n_items: u64,
    pub p: u64,
    pub n: u64,
    pub payload_bit_len: u64,
    pub index_entry_count: u64,
    pub index_offset: u64,
    pub payload_offset: u64,
}

impl Header {
    /// Serialize to exactly `HEADER_LEN` bytes.
    pub fn to_bytes(self) -> [u8; HEADER_LEN as usize] {
        let mut buf = [0u8; HEADER_LEN as usize];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = self.hash_id.to_byte();
        buf[5] = self.index_log2_granularity;
        // bytes 6..8 reserved, already zero
        buf[8..16].copy_from_slice(&self.n_items.to_le_bytes());
        buf[16..24].copy_from_slice(&self.p.to_le_bytes());
        buf[24..32].copy_from_slice(&self.n.to_le_bytes());
        buf[32..40].copy_from_slice(&self.payload_bit_len.to_le_bytes());
        buf[40..48].copy_from_slice(&self.index_entry_count.to_le_bytes());
        buf[48..56].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[56..64].copy_from_slice(&self.payload_offset.to_le_bytes());
        buf
    }

    /// Parse and validate a header from the start of a file.
    ///
    /// Validates magic and hash identity; does not validate index/payload
    /// consistency against the rest of the file (see `query::GcsFilter::open`
    /// for the full open-time validation sequence).
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if (data.len() as u64) < HEADER_LEN {
            return Err(Error::Truncated {
                expected: HEADER_LEN,
                actual: data.len() as u64,
            });
        }
        let mut found = [0u8; 4];
        found.copy_from_slice(&data[0..4]);
        if found != MAGIC {
            return Err(Error::BadMagic { found });
        }

        let hash_id = HashId::from_byte(data[4])?;
        let index_log2_granularity = data[5];
        let n_items = read_u64(data, 8);
        let p = read_u64(data, 16);
        let n = read_u64(data, 24);
        let payload_bit_len = read_u64(data, 32);
        let index_entry_count = read_u64(data, 40);
        let index_offset = read_u64(data, 48);
        let payload_offset = read_u64(data, 56);

        Ok(Header {
            hash_id,
            index_log2_granularity,
            n_items,
            p,
            n,
            payload_bit_len,
            index_entry_count,
            index_offset,
            payload_offset,
        })
    }
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap())
}
