//! Prefix enumeration over a subtree of the trie
//!
//! [`TailTrie::prefix_search`] walks a pattern as far as it reaches and
//! snapshots every tail index below the stopping point, depth-first with
//! children pushed in reverse label order so the snapshot comes out in
//! ascending encoded-key order. The resulting [`TrieIterator`] is a detached
//! cursor: it holds tail indices and a fingerprint of the trie's mutation
//! counter, never raw positions into the arrays, so relocation during its
//! lifetime cannot corrupt it — any mutation is instead caught by the
//! fingerprint check on the next advance.

use crate::alphabet::AlphabetCodec;
use crate::double_array::{DoubleArray, DA_POOL_ROOT};
use crate::error::{Result, TailTrieError};
use crate::stack::IntStack;
use crate::trie::{walk_encoded, TailTrie};
use crate::TrieIndex;

/// Detached cursor over the entries matched by a prefix search
///
/// Created by [`TailTrie::prefix_search`]. The trie is passed back in on
/// every advance; if it has mutated since the cursor was created,
/// [`TrieIterator::next_entry`] reports
/// [`TailTrieError::IteratorInvalidated`].
#[derive(Debug)]
pub struct TrieIterator {
    states: Vec<TrieIndex>,
    pos: usize,
    fingerprint: u64,
}

impl TrieIterator {
    pub(crate) fn with_states(states: Vec<TrieIndex>, fingerprint: u64) -> Self {
        Self {
            states,
            pos: 0,
            fingerprint,
        }
    }

    /// Number of entries not yet visited
    pub fn remaining(&self) -> usize {
        self.states.len() - self.pos
    }

    /// Advance to the next entry, yielding its key and value
    ///
    /// Returns `Ok(None)` when the enumeration is exhausted and an
    /// [`TailTrieError::IteratorInvalidated`] error when the trie has
    /// mutated since this cursor was created.
    pub fn next_entry<'t, V, A: AlphabetCodec>(
        &mut self,
        trie: &'t TailTrie<V, A>,
    ) -> Result<Option<(&'t [u8], &'t V)>> {
        let actual = trie.fingerprint();
        if actual != self.fingerprint {
            return Err(TailTrieError::iterator_invalidated(self.fingerprint, actual));
        }
        while self.pos < self.states.len() {
            let tail_idx = self.states[self.pos];
            self.pos += 1;
            if let Some(entry) = trie.tail_pool().entry(tail_idx) {
                return Ok(Some((entry.key(), entry.value())));
            }
        }
        Ok(None)
    }

    /// Drain the cursor, collecting the remaining keys in order
    pub fn collect_keys<V, A: AlphabetCodec>(
        &mut self,
        trie: &TailTrie<V, A>,
    ) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::with_capacity(self.remaining());
        while let Some((key, _)) = self.next_entry(trie)? {
            keys.push(key.to_vec());
        }
        Ok(keys)
    }
}

/// Depth-first collection of every tail index under `start`, ascending in
/// label order at every level
fn collect_subtree(da: &DoubleArray, start: TrieIndex) -> Vec<TrieIndex> {
    let mut states = Vec::new();
    let mut stack = IntStack::new();
    stack.push(start);

    while let Some(s) = stack.pop() {
        let base = da.get_base(s);
        if base < 0 {
            states.push(-base);
        } else {
            let syms = da.fill_symbols(s);
            for i in (0..syms.num()).rev() {
                stack.push(base + syms.get(i) as TrieIndex);
            }
        }
    }
    states
}

impl<V, A: AlphabetCodec> TailTrie<V, A> {
    /// Enumerate the keys matching `pattern`
    ///
    /// A trailing `*` makes the pattern a prefix wildcard: the encoded prefix
    /// is walked as far as the branches reach, and every key below the
    /// stopping point is collected; a prefix that runs into a tail matches at
    /// most the single key stored there. Without the wildcard the pattern is
    /// an exact-match lookup yielding zero or one entry. Keys come out in
    /// ascending byte-lexicographic order of their encoded form.
    pub fn prefix_search(&self, pattern: &[u8]) -> Result<TrieIterator> {
        let fingerprint = self.fingerprint();

        if pattern.last() != Some(&b'*') {
            let encoded = self.alphabet().encode(pattern)?;
            let found = self
                .double_array()
                .and_then(|da| walk_encoded(da, self.tail_pool(), &encoded));
            let states = match found {
                Some((_, tail_idx)) => vec![tail_idx],
                None => Vec::new(),
            };
            return Ok(TrieIterator::with_states(states, fingerprint));
        }

        let encoded = self.alphabet().encode(&pattern[..pattern.len() - 1])?;
        let prefix = &encoded[..encoded.len() - 1];
        let Some(da) = self.double_array() else {
            return Ok(TrieIterator::with_states(Vec::new(), fingerprint));
        };

        let mut s = DA_POOL_ROOT;
        let mut i = 0;
        while i < prefix.len() && !da.is_tail(s) {
            if !da.walk(&mut s, prefix[i]) {
                return Ok(TrieIterator::with_states(Vec::new(), fingerprint));
            }
            i += 1;
        }

        if da.is_tail(s) {
            // the prefix continues into a tail: at most one key below
            let tail_idx = da.tail_index(s);
            let mut suffix_idx = 0;
            while i < prefix.len() {
                if !self.tail_pool().walk_tail(tail_idx, &mut suffix_idx, prefix[i]) {
                    return Ok(TrieIterator::with_states(Vec::new(), fingerprint));
                }
                i += 1;
            }
            return Ok(TrieIterator::with_states(vec![tail_idx], fingerprint));
        }

        Ok(TrieIterator::with_states(
            collect_subtree(da, s),
            fingerprint,
        ))
    }

    /// Enumerate every key, equivalent to `prefix_search(b"*")`
    pub fn iter_all(&self) -> Result<TrieIterator> {
        self.prefix_search(b"*")
    }

    /// Collect the keys matching `pattern` in order
    pub fn prefix_keys(&self, pattern: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.prefix_search(pattern)?.collect_keys(self)
    }
}
