// A canonical, hashable representation of a set of NFA node ids (spec §4.4).
//
// Two representations are supported: a 64-bit bitmask for small ids, and a
// sorted `Vec<u32>` otherwise, matching §4.4's "Bitmask, when all ids are
// below a small threshold... Sorted int array, otherwise". Conversion
// between the two is automatic. Both forms cache their hash so that hot-path
// comparisons (DFA node lookup during matching) go through the cached hash
// first, per §9 "Set-of-sets equality in hot paths".

use std::hash::{Hash, Hasher};

use crate::nfa::NfaNodeId;

/// Ids at or above this value force the sorted-array representation.
const BITMASK_WIDTH: u32 = 64;

#[derive(Clone, Debug)]
enum Repr {
    Bitmask(u64),
    Sorted(Vec<u32>),
}

/// A canonical set of [`NfaNodeId`]s, used as the basis of a DFA node.
///
/// Equality and hashing depend only on which ids are present, never on the
/// chosen representation or the order ids were inserted in (§3 invariant).
#[derive(Clone, Debug)]
pub struct StateSet {
    repr: Repr,
    cached_hash: u64,
}

impl StateSet {
    pub fn new() -> Self {
        let mut s = StateSet {
            repr: Repr::Bitmask(0),
            cached_hash: 0,
        };
        s.rehash();
        s
    }

    pub fn from_ids(ids: impl IntoIterator<Item = NfaNodeId>) -> Self {
        let mut s = StateSet::new();
        for id in ids {
            s.insert(id);
        }
        s
    }

    pub fn is_empty(&self) -> bool {
        match &self.repr {
            Repr::Bitmask(bits) => *bits == 0,
            Repr::Sorted(v) => v.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Bitmask(bits) => bits.count_ones() as usize,
            Repr::Sorted(v) => v.len(),
        }
    }

    pub fn contains(&self, id: NfaNodeId) -> bool {
        match &self.repr {
            Repr::Bitmask(bits) => id.0 < BITMASK_WIDTH && (bits & (1u64 << id.0)) != 0,
            Repr::Sorted(v) => v.binary_search(&id.0).is_ok(),
        }
    }

    pub fn insert(&mut self, id: NfaNodeId) {
        if self.contains(id) {
            return;
        }
        match &mut self.repr {
            Repr::Bitmask(bits) if id.0 < BITMASK_WIDTH => {
                *bits |= 1u64 << id.0;
            }
            Repr::Bitmask(bits) => {
                // Overflowed the bitmask width: convert to sorted array.
                let mut v: Vec<u32> = (0..BITMASK_WIDTH).filter(|i| *bits & (1u64 << i) != 0).collect();
                let pos = v.partition_point(|&x| x < id.0);
                v.insert(pos, id.0);
                self.repr = Repr::Sorted(v);
            }
            Repr::Sorted(v) => {
                let pos = v.partition_point(|&x| x < id.0);
                v.insert(pos, id.0);
            }
        }
        self.rehash();
    }

    pub fn iter(&self) -> impl Iterator<Item = NfaNodeId> + '_ {
        let bitmask_iter = match &self.repr {
            Repr::Bitmask(bits) => {
                let bits = *bits;
                Some((0..BITMASK_WIDTH).filter(move |i| bits & (1u64 << i) != 0))
            }
            Repr::Sorted(_) => None,
        };
        let sorted_iter = match &self.repr {
            Repr::Sorted(v) => Some(v.iter().copied()),
            Repr::Bitmask(_) => None,
        };
        bitmask_iter
            .into_iter()
            .flatten()
            .chain(sorted_iter.into_iter().flatten())
            .map(NfaNodeId)
    }

    fn rehash(&mut self) {
        // Normalize to the same hash regardless of representation: hash the
        // sorted sequence of ids, not the bit layout.
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        match &self.repr {
            Repr::Bitmask(bits) => {
                for i in 0..BITMASK_WIDTH {
                    if bits & (1u64 << i) != 0 {
                        i.hash(&mut hasher);
                    }
                }
            }
            Repr::Sorted(v) => {
                for id in v {
                    id.hash(&mut hasher);
                }
            }
        }
        self.cached_hash = hasher.finish();
    }
}

impl Default for StateSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        if self.cached_hash != other.cached_hash {
            return false;
        }
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|id| other.contains(id))
    }
}

impl Eq for StateSet {}

impl Hash for StateSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cached_hash.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[u32]) -> StateSet {
        StateSet::from_ids(xs.iter().map(|&x| NfaNodeId(x)))
    }

    #[test]
    fn equal_content_equal_regardless_of_insertion_order() {
        let a = ids(&[1, 2, 3]);
        let b = ids(&[3, 1, 2]);
        assert_eq!(a, b);
        let mut h = std::collections::hash_map::DefaultHasher::new();
        use std::hash::{Hash, Hasher};
        a.hash(&mut h);
        let ha = h.finish();
        let mut h2 = std::collections::hash_map::DefaultHasher::new();
        b.hash(&mut h2);
        let hb = h2.finish();
        assert_eq!(ha, hb);
    }

    #[test]
    fn distinct_subsets_are_distinct() {
        let a = ids(&[1, 2]);
        let b = ids(&[1, 3]);
        let c = ids(&[2, 3]);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn overflow_converts_to_sorted_and_stays_equal() {
        let mut a = StateSet::new();
        for i in 0..100u32 {
            a.insert(NfaNodeId(i));
        }
        let mut b = StateSet::new();
        for i in (0..100u32).rev() {
            b.insert(NfaNodeId(i));
        }
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
    }

    #[test]
    fn duplicated_insertion_is_idempotent() {
        let mut a = ids(&[1, 2]);
        let b = ids(&[1, 2, 2, 1]);
        a.insert(NfaNodeId(1));
        assert_eq!(a, b);
    }
}
