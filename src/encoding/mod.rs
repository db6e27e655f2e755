//! Field encoding shared by every key family.
//!
//! `key` covers the length-prefixed address discipline and fixed-width
//! integers; `time` covers the sortable timestamp encoding used by the queues.

pub mod key;
pub mod time;

pub use key::{inclusive_end, length_prefixed, prefix_end, KeyReader, KeyWriter};
pub use time::{SortableTime, TimeCodec};
