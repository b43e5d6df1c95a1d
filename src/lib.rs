//! Ordered maps over byte-string keys with predecessor/successor search.
//!
//! Four structures share one contract ([`OrderedMap`]):
//!
//! - [`XFastTrie`]: hash-indexed bitwise trie over fixed-width keys,
//!   O(log log U) ordered queries.
//! - [`YFastTrie`]: x-fast index over cluster representatives, same query
//!   bound with O(n) space and amortized updates.
//! - [`ByteMap`]: adaptive radix trie over variable-length keys.
//! - [`LoudsTrie`]: succinct level-order trie, bulk-built and navigated by
//!   rank/select over a [`BitVector`].

pub mod bit_vector;
pub mod bitmap;
pub mod byte_map;
pub mod error;
pub mod louds_trie;
pub mod ordered_map;
mod utils;
pub mod x_fast_trie;
pub mod y_fast_trie;


pub use bit_vector::BitVector;
pub use byte_map::ByteMap;
pub use error::{Error, Result};
pub use louds_trie::LoudsTrie;
pub use ordered_map::OrderedMap;
pub use x_fast_trie::XFastTrie;
pub use y_fast_trie::YFastTrie;
