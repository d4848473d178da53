//! # tailtrie: Double-Array Trie with Tail Compression
//!
//! An ordered associative container mapping byte-string keys to values,
//! built on a double-array trie with tail-pool suffix compression.
//!
//! ## Key Features
//!
//! - **Constant-time transitions**: an edge labelled `c` from state `s`
//!   lands at `base[s] + c` with a single array probe
//! - **Tail compression**: non-branching path suffixes live in a side pool
//!   instead of occupying one state per symbol
//! - **Prefix enumeration**: wildcard patterns (`pr*`) walk a subtree in
//!   ascending key order
//! - **Configurable alphabet**: keys are translated through range-based
//!   codecs holding up to 255 distinct symbols
//! - **Self-recycling storage**: free cells thread a doubly-linked list
//!   through the trie arrays themselves and deletions prune dead paths
//!
//! ## Quick Start
//!
//! ```rust
//! use tailtrie::{AlphabetMap, TailTrie};
//!
//! let mut trie: TailTrie<u64> = TailTrie::with_alphabet(AlphabetMap::printable_ascii());
//! trie.insert(b"pool", 1).unwrap();
//! trie.insert(b"prize", 2).unwrap();
//! trie.insert(b"preview", 3).unwrap();
//!
//! assert_eq!(trie.get(b"pool"), Some(&1));
//! assert_eq!(trie.get(b"pre"), None);
//!
//! let keys = trie.prefix_keys(b"pr*").unwrap();
//! assert_eq!(keys, vec![b"preview".to_vec(), b"prize".to_vec()]);
//!
//! trie.delete(b"pool").unwrap();
//! assert_eq!(trie.get(b"pool"), None);
//! ```
//!
//! The engine is single-threaded by design: every operation completes
//! synchronously and callers serialize access at a higher layer. Iterators
//! are detached cursors guarded by a mutation fingerprint rather than
//! borrows, so a stale cursor reports an error instead of observing a
//! relocated subtree.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod alphabet;
pub mod double_array;
pub mod error;
pub mod iter;
pub mod stack;
pub mod symbols;
pub mod tail;
pub mod trie;

pub use alphabet::{AlphabetCodec, AlphabetMap, TERM, TRIE_CHAR_MAX};
pub use double_array::{DoubleArray, TRIE_INDEX_ERROR, TRIE_INDEX_HALFMAX, TRIE_INDEX_MAX};
pub use error::{Result, TailTrieError};
pub use iter::TrieIterator;
pub use stack::IntStack;
pub use symbols::Symbols;
pub use tail::{TailEntry, TailPool};
pub use trie::{TailTrie, TrieConfig, TrieStats};

/// State and tail index type: a signed integer so that negative values can
/// discriminate free cells and tail pointers inside the trie arrays
pub type TrieIndex = i32;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_re_exports() {
        let mut trie: TailTrie<i32> = TailTrie::new();
        trie.insert(b"smoke", 1).unwrap();
        assert!(trie.contains(b"smoke"));
        assert_eq!(TERM, 0);
        assert_eq!(TRIE_INDEX_MAX, i32::MAX);
    }
}
