//! Sorted neighbor sets with an optional dense bitmap
//!
//! Small sets intersect by a merge walk over the sorted ids. A set larger
//! than the configured threshold also carries a presence bitmap over the
//! whole vertex range, and intersections against it probe the other side's
//! ids instead.

/// Default size above which a neighbor set carries a bitmap
pub const DEFAULT_BITMAP_THRESHOLD: usize = 1024;

/// Fixed-size bit vector over `[0, len)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
}

impl BitVector {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    #[inline]
    pub fn set(&mut self, bit: u32) {
        let bit = bit as usize;
        debug_assert!(bit < self.len);
        self.words[bit / 64] |= 1u64 << (bit % 64);
    }

    #[inline]
    pub fn get(&self, bit: u32) -> bool {
        let bit = bit as usize;
        bit < self.len && self.words[bit / 64] & (1u64 << (bit % 64)) != 0
    }
}

/// Immutable sorted, duplicate-free vertex id set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighborSet {
    ids: Vec<u32>,
    bits: Option<BitVector>,
}

impl NeighborSet {
    /// Wrap sorted unique `ids`; builds a bitmap of `universe` bits when
    /// there are more than `bitmap_threshold` of them.
    pub fn new(ids: Vec<u32>, bitmap_threshold: usize, universe: usize) -> Self {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let bits = (ids.len() > bitmap_threshold).then(|| {
            let mut bits = BitVector::new(universe);
            for &id in &ids {
                bits.set(id);
            }
            bits
        });
        Self { ids, bits }
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn has_bitmap(&self) -> bool {
        self.bits.is_some()
    }

    pub fn contains(&self, id: u32) -> bool {
        match &self.bits {
            Some(bits) => bits.get(id),
            None => self.ids.binary_search(&id).is_ok(),
        }
    }

    /// Position of `id` in [`ids`](Self::ids)
    pub fn position(&self, id: u32) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// `|self ∩ other|`
    pub fn intersection_len(&self, other: &NeighborSet) -> usize {
        match (&self.bits, &other.bits) {
            (Some(_), Some(_)) => {
                let (small, large) = if self.len() <= other.len() {
                    (self, other)
                } else {
                    (other, self)
                };
                probe_len(&small.ids, large)
            }
            (Some(_), None) => probe_len(&other.ids, self),
            (None, Some(_)) => probe_len(&self.ids, other),
            (None, None) => merge_intersection_len(&self.ids, &other.ids),
        }
    }
}

fn probe_len(ids: &[u32], dense: &NeighborSet) -> usize {
    ids.iter().filter(|&&id| dense.contains(id)).count()
}

/// Size of the intersection of two sorted unique slices
pub fn merge_intersection_len(a: &[u32], b: &[u32]) -> usize {
    let mut i = 0;
    let mut j = 0;
    let mut count = 0;

    // Branchless step: advance whichever side is behind, both on a match
    while i < a.len() && j < b.len() {
        let va = a[i];
        let vb = b[j];

        let le = va <= vb;
        let ge = va >= vb;

        count += (le && ge) as usize;
        i += le as usize;
        j += ge as usize;
    }
    count
}
