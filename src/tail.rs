//! Tail pool: suffix storage for non-branching paths
//!
//! Any path that currently has no branching below a state is pulled out of
//! the double-array and stored here as a single entry: the remaining suffix
//! (TERM-terminated), an owned copy of the full external key, and the value.
//! Entries are addressed by external tail indices offset by
//! [`TAIL_START_BLOCKNO`]; vacant slots form a singly-linked free list kept
//! in ascending order.

use log::debug;

use crate::alphabet::TERM;
use crate::double_array::TRIE_INDEX_MAX;
use crate::error::{Result, TailTrieError};
use crate::TrieIndex;

/// Offset between pool block numbers and external tail indices
pub(crate) const TAIL_START_BLOCKNO: TrieIndex = 2;

/// In-memory sanity marker for the tail pool (informational, the pool has no
/// header cell)
pub(crate) const TAIL_SIGNATURE: u32 = 0xDFFC_DFFC;

/// One stored key: TERM-terminated suffix (null until installed), owned
/// external key, owned value
pub struct TailEntry<V> {
    pub(crate) suffix: Option<Vec<u8>>,
    pub(crate) key: Vec<u8>,
    pub(crate) val: V,
}

impl<V> TailEntry<V> {
    pub(crate) fn new(suffix: Vec<u8>, key: Vec<u8>, val: V) -> Self {
        Self {
            suffix: Some(suffix),
            key,
            val,
        }
    }

    /// The full external key this entry stores
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The stored value
    pub fn value(&self) -> &V {
        &self.val
    }
}

/// A pool slot; `next_free` discriminates: `-1` in use, `0` end of the free
/// chain, otherwise the external index of the next free slot
struct TailSlot<V> {
    entry: Option<TailEntry<V>>,
    next_free: i64,
}

impl<V> TailSlot<V> {
    fn vacant() -> Self {
        Self {
            entry: None,
            next_free: 0,
        }
    }
}

/// Slab of tail entries with an ascending free list
pub struct TailPool<V> {
    slots: Vec<TailSlot<V>>,
    /// External index of the first free slot; 0 when none
    first_free: i64,
    used: usize,
}

impl<V> TailPool<V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            first_free: 0,
            used: 0,
        }
    }

    /// Number of entries currently in use
    pub fn used(&self) -> usize {
        self.used
    }

    /// Number of slots (used and vacant) in the pool
    pub fn slots(&self) -> usize {
        self.slots.len()
    }

    fn block(&self, index: TrieIndex) -> Option<usize> {
        let b = index as i64 - TAIL_START_BLOCKNO as i64;
        if b >= 0 && (b as usize) < self.slots.len() {
            Some(b as usize)
        } else {
            None
        }
    }

    fn ext(block: usize) -> i64 {
        block as i64 + TAIL_START_BLOCKNO as i64
    }

    /// Allocate a slot and return its external tail index
    ///
    /// Pops the free list when possible, otherwise doubles the pool and
    /// chains the new upper half into the list.
    pub(crate) fn alloc(&mut self) -> Result<TrieIndex> {
        let block = if self.first_free != 0 {
            let block = (self.first_free - TAIL_START_BLOCKNO as i64) as usize;
            self.first_free = self.slots[block].next_free;
            block
        } else {
            let block = self.slots.len();
            let max_blocks = (TRIE_INDEX_MAX - TAIL_START_BLOCKNO) as usize;
            if block >= max_blocks {
                return Err(TailTrieError::index_space_exhausted(block + 1));
            }
            let mut new_size = 4usize;
            while new_size <= block {
                new_size <<= 1;
            }
            let new_size = new_size.min(max_blocks);
            debug!("growing tail pool: {} -> {} slots", block, new_size);
            self.slots.resize_with(new_size, TailSlot::vacant);
            for i in block + 1..new_size - 1 {
                self.slots[i].next_free = Self::ext(i + 1);
            }
            self.slots[new_size - 1].next_free = 0;
            self.first_free = Self::ext(block + 1);
            block
        };

        let slot = &mut self.slots[block];
        slot.next_free = -1;
        slot.entry = None;
        self.used += 1;
        Ok(block as TrieIndex + TAIL_START_BLOCKNO)
    }

    /// Install the entry for a freshly allocated slot
    pub(crate) fn install(&mut self, index: TrieIndex, entry: TailEntry<V>) {
        if let Some(b) = self.block(index) {
            self.slots[b].entry = Some(entry);
        }
    }

    /// Release a slot, returning its entry; the slot is inserted into the
    /// free list in ascending index order
    pub(crate) fn free(&mut self, index: TrieIndex) -> Option<TailEntry<V>> {
        let block = self.block(index)?;
        if self.slots[block].next_free != -1 {
            return None;
        }
        let entry = self.slots[block].entry.take();

        let target = index as i64;
        let mut prev = 0i64;
        let mut cur = self.first_free;
        while cur != 0 && cur < target {
            prev = cur;
            cur = self.slots[(cur - TAIL_START_BLOCKNO as i64) as usize].next_free;
        }
        self.slots[block].next_free = cur;
        if prev != 0 {
            self.slots[(prev - TAIL_START_BLOCKNO as i64) as usize].next_free = target;
        } else {
            self.first_free = target;
        }

        self.used -= 1;
        entry
    }

    /// Entry at `index`, when the slot is in use and installed
    pub fn entry(&self, index: TrieIndex) -> Option<&TailEntry<V>> {
        self.block(index).and_then(|b| self.slots[b].entry.as_ref())
    }

    pub(crate) fn entry_mut(&mut self, index: TrieIndex) -> Option<&mut TailEntry<V>> {
        let b = self.block(index)?;
        self.slots[b].entry.as_mut()
    }

    /// Overwrite the stored suffix of an entry; `None` installs a null
    /// suffix, which no walk can match
    ///
    /// Takes the new suffix by value: the caller copies out of the old one
    /// first, so a suffix derived from the entry itself is always safe.
    pub(crate) fn set_suffix(&mut self, index: TrieIndex, suffix: Option<Vec<u8>>) -> bool {
        let Some(b) = self.block(index) else {
            return false;
        };
        match self.slots[b].entry.as_mut() {
            Some(entry) => {
                entry.suffix = suffix;
                true
            }
            None => false,
        }
    }

    /// Match `c` against the suffix of entry `index` at `*suffix_idx`,
    /// advancing the position on success unless `c` is [`TERM`]
    pub fn walk_tail(&self, index: TrieIndex, suffix_idx: &mut usize, c: u8) -> bool {
        let Some(entry) = self.entry(index) else {
            return false;
        };
        let Some(suffix) = entry.suffix.as_ref() else {
            return false;
        };
        let Some(&suffix_char) = suffix.get(*suffix_idx) else {
            return false;
        };
        if suffix_char == c {
            if suffix_char != TERM {
                *suffix_idx += 1;
            }
            return true;
        }
        false
    }

    /// Drop every entry (invoking `progress` every 2^16 slots) and release
    /// the slab
    pub(crate) fn reset_with<F: FnMut()>(&mut self, mut progress: F) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if i & 0xFFFF == 0 {
                progress();
            }
            slot.entry = None;
        }
        self.slots = Vec::new();
        self.first_free = 0;
        self.used = 0;
    }

    /// Iterate over the in-use, installed entries
    pub(crate) fn entries(&self) -> impl Iterator<Item = &TailEntry<V>> {
        self.slots.iter().filter_map(|slot| slot.entry.as_ref())
    }

    /// Check pool invariants: the used counter matches the in-use slots and
    /// the free chain is ascending, covering every vacant slot
    pub(crate) fn validate(&self) -> Result<()> {
        let in_use = self.slots.iter().filter(|s| s.next_free == -1).count();
        if in_use != self.used {
            return Err(TailTrieError::corrupted(format!(
                "tail pool used counter {} != {} in-use slots",
                self.used, in_use
            )));
        }

        let mut chain = 0usize;
        let mut last = 0i64;
        let mut cur = self.first_free;
        while cur != 0 {
            if chain > self.slots.len() {
                return Err(TailTrieError::corrupted("tail free list cycle"));
            }
            if cur <= last {
                return Err(TailTrieError::corrupted("tail free list not ascending"));
            }
            let b = cur - TAIL_START_BLOCKNO as i64;
            if b < 0 || b as usize >= self.slots.len() {
                return Err(TailTrieError::corrupted(format!(
                    "tail free pointer {} out of range",
                    cur
                )));
            }
            if self.slots[b as usize].next_free == -1 {
                return Err(TailTrieError::corrupted(format!(
                    "tail free list points at live slot {}",
                    cur
                )));
            }
            last = cur;
            cur = self.slots[b as usize].next_free;
            chain += 1;
        }
        if chain != self.slots.len() - self.used {
            return Err(TailTrieError::corrupted(format!(
                "tail free list covers {} of {} vacant slots",
                chain,
                self.slots.len() - self.used
            )));
        }

        Ok(())
    }

    /// Bytes held by the pool, including suffix and key storage
    pub fn memory_usage(&self) -> usize {
        let slab = self.slots.len() * std::mem::size_of::<TailSlot<V>>();
        let heap: usize = self
            .entries()
            .map(|e| e.suffix.as_ref().map_or(0, Vec::len) + e.key.len())
            .sum();
        slab + heap
    }
}

impl<V> std::fmt::Debug for TailPool<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TailPool")
            .field("signature", &format_args!("{:#010x}", TAIL_SIGNATURE))
            .field("slots", &self.slots.len())
            .field("used", &self.used)
            .field("first_free", &self.first_free)
            .finish()
    }
}
