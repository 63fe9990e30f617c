//! Hash index from keys to their position in the ordered entry sequence.
//!
//! The table never stores keys or hashes, only positions. Callers supply the hash of the key
//! they look for together with an equality check and a rehash function that both operate on
//! positions.
use hashbrown::hash_table::HashTable;

#[derive(Debug, Clone)]
pub enum IndexTable {
    Small(HashTable<u32>),
    Large(HashTable<usize>),
}

#[derive(Debug)]
pub enum OccupiedEntry<'a> {
    Small(hashbrown::hash_table::OccupiedEntry<'a, u32>),
    Large(hashbrown::hash_table::OccupiedEntry<'a, usize>),
}

#[derive(Debug)]
pub enum VacantEntry<'a> {
    Small(hashbrown::hash_table::VacantEntry<'a, u32>),
    Large(hashbrown::hash_table::VacantEntry<'a, usize>),
}

#[derive(Debug)]
pub enum Entry<'a> {
    Occupied(OccupiedEntry<'a>),
    Vacant(VacantEntry<'a>),
}

impl Default for IndexTable {
    fn default() -> Self {
        IndexTable::Small(HashTable::new())
    }
}

impl IndexTable {
    pub fn with_capacity(capacity: usize) -> Self {
        if Self::try_as_small(capacity).is_ok() {
            IndexTable::Small(HashTable::with_capacity(capacity))
        } else {
            IndexTable::Large(HashTable::with_capacity(capacity))
        }
    }
    #[inline(always)]
    fn as_small(index: usize) -> u32 {
        // `grow_for` upgrades the table before any position that does not fit is stored.
        Self::try_as_small(index).expect("position does not fit a small index table")
    }
    #[inline(always)]
    fn try_as_small(index: usize) -> Result<u32, std::num::TryFromIntError> {
        u32::try_from(index)
    }
    #[inline(always)]
    pub fn entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(usize) -> bool,
        hasher: impl Fn(usize) -> u64,
    ) -> Entry<'_> {
        match self {
            IndexTable::Small(table) => match table.entry(
                hash,
                |&index| eq(index as usize),
                |&index| hasher(index as usize),
            ) {
                hashbrown::hash_table::Entry::Occupied(entry) => {
                    Entry::Occupied(OccupiedEntry::Small(entry))
                }
                hashbrown::hash_table::Entry::Vacant(entry) => {
                    Entry::Vacant(VacantEntry::Small(entry))
                }
            },
            IndexTable::Large(table) => {
                match table.entry(hash, |&index| eq(index), |&index| hasher(index)) {
                    hashbrown::hash_table::Entry::Occupied(entry) => {
                        Entry::Occupied(OccupiedEntry::Large(entry))
                    }
                    hashbrown::hash_table::Entry::Vacant(entry) => {
                        Entry::Vacant(VacantEntry::Large(entry))
                    }
                }
            }
        }
    }
    #[inline(always)]
    pub fn find_entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(usize) -> bool,
    ) -> Option<OccupiedEntry<'_>> {
        match self {
            IndexTable::Small(table) => table
                .find_entry(hash, |&index| eq(index as usize))
                .ok()
                .map(OccupiedEntry::Small),
            IndexTable::Large(table) => table
                .find_entry(hash, |&index| eq(index))
                .ok()
                .map(OccupiedEntry::Large),
        }
    }
    #[inline(always)]
    pub fn find(&self, hash: u64, mut eq: impl FnMut(usize) -> bool) -> Option<usize> {
        match self {
            IndexTable::Small(table) => table
                .find(hash, |&index| eq(index as usize))
                .map(|&index| index as usize),
            IndexTable::Large(table) => table.find(hash, |&index| eq(index)).copied(),
        }
    }
    #[inline(always)]
    pub fn is_small(&self) -> bool {
        match self {
            IndexTable::Small(_) => true,
            IndexTable::Large(_) => false,
        }
    }
    /// Makes sure that position `index` can be stored, switching to `usize` positions if needed.
    #[inline(always)]
    pub fn grow_for(&mut self, index: usize, hasher: impl Fn(usize) -> u64) {
        if Self::try_as_small(index).is_err() && self.is_small() {
            self.grow_cold(hasher)
        }
    }
    #[inline(never)]
    #[cold]
    fn grow_cold(&mut self, hasher: impl Fn(usize) -> u64) {
        let old_table = match std::mem::replace(self, IndexTable::Large(HashTable::new())) {
            IndexTable::Small(old_table) => old_table,
            large => {
                *self = large;
                return;
            }
        };
        if let IndexTable::Large(new_table) = self {
            new_table.reserve(old_table.len(), |&j| hasher(j));
            for i in old_table {
                new_table.insert_unique(hasher(i as usize), i as usize, |&j| hasher(j));
            }
        }
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        match self {
            IndexTable::Small(table) => table.len(),
            IndexTable::Large(table) => table.len(),
        }
    }
    #[inline(always)]
    pub fn clear(&mut self) {
        match self {
            IndexTable::Small(table) => table.clear(),
            IndexTable::Large(table) => table.clear(),
        }
    }
    #[inline(always)]
    pub fn retain(&mut self, mut f: impl FnMut(usize) -> Option<usize>) {
        match self {
            IndexTable::Small(table) => table.retain(|index| match f(*index as usize) {
                Some(new_index) => {
                    *index = Self::as_small(new_index);
                    true
                }
                None => false,
            }),
            IndexTable::Large(table) => table.retain(|index| match f(*index) {
                Some(new_index) => {
                    *index = new_index;
                    true
                }
                None => false,
            }),
        }
    }
    #[inline(always)]
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(usize) -> u64) {
        self.grow_for((self.len() + additional).saturating_sub(1), &hasher);
        match self {
            IndexTable::Small(table) => table.reserve(additional, |&index| hasher(index as usize)),
            IndexTable::Large(table) => table.reserve(additional, |&index| hasher(index)),
        }
    }
    /// Closes the gap left by removing the entry at position `removed`.
    ///
    /// The position `removed` itself must already be gone from the table. Every position after
    /// it moves down by one, matching a `Vec::remove` on the entry sequence.
    pub fn close_gap(&mut self, removed: usize) {
        self.retain(|index| Some(if index > removed { index - 1 } else { index }));
    }
}

impl<'a> VacantEntry<'a> {
    #[inline(always)]
    pub fn insert(self, index: usize) -> OccupiedEntry<'a> {
        match self {
            VacantEntry::Small(entry) => {
                OccupiedEntry::Small(entry.insert(IndexTable::as_small(index)))
            }
            VacantEntry::Large(entry) => OccupiedEntry::Large(entry.insert(index)),
        }
    }
}

impl OccupiedEntry<'_> {
    #[inline(always)]
    pub fn get(&self) -> usize {
        match self {
            OccupiedEntry::Small(entry) => *entry.get() as usize,
            OccupiedEntry::Large(entry) => *entry.get(),
        }
    }
    /// Removes the position from the table and returns it.
    #[inline(always)]
    pub fn remove(self) -> usize {
        match self {
            OccupiedEntry::Small(entry) => entry.remove().0 as usize,
            OccupiedEntry::Large(entry) => entry.remove().0,
        }
    }
}
