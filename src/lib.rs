//! Golomb Compressed Set (GCS): a static, space-efficient probabilistic
//! membership filter.
//!
//! A filter is built once from a set of items (`GcsBuilder`) and then opened
//! read-only, any number of times, for membership queries (`GcsFilter`).
//! Both halves operate on the wire format described in `format::Header`.
//!
//! ## Workflow
//!
//! ```no_run
//! use gcs_filter::{GcsBuilder, GcsFilter, HashId};
//!
//! let mut builder = GcsBuilder::new(HashId::SipHash24, 1_000_000).unwrap();
//! builder.insert(&b"alice"[..]);
//! builder.insert(&b"bob"[..]);
//! let mut file = std::fs::File::create("filter.gcs").unwrap();
//! builder.finish(&mut file).unwrap();
//!
//! let filter = GcsFilter::open("filter.gcs").unwrap();
//! assert!(filter.contains(b"alice"));
//! ```

pub mod bitio;
pub mod builder;
pub mod error;
pub mod format;
pub mod hash;
pub mod index;
pub mod preprocess;
pub mod query;
pub mod rice;

pub use builder::GcsBuilder;
pub use error::{Error, Result};
pub use format::Header;
pub use hash::HashId;
pub use preprocess::InputMode;
pub use query::GcsFilter;
