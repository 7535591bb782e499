// The domination protocol (spec §4.2 "Domination ordering", §4.5
// "Domination heap", §9 "Priority queues with O(n) removal").
//
// A `Match` is a potential or committed match record; `domination_cmp`
// implements the total preorder from §4.2 exactly (earlier `start` strongly
// preferred; ties broken by longer `end`; matches of different regexes
// compare equal, since each regex owns an independent heap and the
// comparator is never actually invoked across regexes in practice). Rust's
// type system makes "compare(m, null)" impossible to express in the first
// place: `domination_cmp` takes two `&Match` values, never an `Option`, so
// the null-contract-violation case from §8 property 3 has no code path to
// test (see DESIGN.md).
//
// `DominationHeap` is a binary heap over `Vec<Match>` with a side table from
// `MatchId` to heap slot, giving `remove(id)` in `O(log n)` rather than the
// `O(n)` scan a tree-map-based heap would need (§9).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::regexp::RegexpId;

/// A process-wide-unique identifier for a [`Match`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchId(pub u64);

static NEXT_MATCH_ID: AtomicU64 = AtomicU64::new(0);

impl MatchId {
    pub fn fresh() -> MatchId {
        MatchId(NEXT_MATCH_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// A potential or committed match: `(regex, start, end, flags)`
/// (§GLOSSARY "Match").
#[derive(Clone, Copy, Debug)]
pub struct Match {
    id: MatchId,
    regexp: RegexpId,
    start: usize,
    end: usize,
    /// No further extension is possible from the match's current DFA node.
    final_: bool,
    /// Removed from future consideration (committed or dominated away).
    inactive: bool,
}

impl Match {
    /// Creates a match born at `start` (§4.3 step 2: seed matches are
    /// created with `start = end = p`, since the character at `p` has
    /// already been consumed by the DFA transition that produced them).
    pub fn new(regexp: RegexpId, start: usize) -> Self {
        Match {
            id: MatchId::fresh(),
            regexp,
            start,
            end: start,
            final_: false,
            inactive: false,
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn regexp(&self) -> RegexpId {
        self.regexp
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn extend_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.start, "match cannot extend before its own start");
        self.end = pos;
    }

    pub fn is_final(&self) -> bool {
        self.final_
    }

    pub fn mark_final(&mut self) {
        self.final_ = true;
    }

    pub fn is_inactive(&self) -> bool {
        self.inactive
    }

    pub fn mark_inactive(&mut self) {
        self.inactive = true;
    }

    /// Committable iff final, inactive, and (checked by the caller) the
    /// minimum of its regex's heap (§4.2 "Commit rule").
    pub fn is_commit_ready(&self) -> bool {
        self.final_ && self.inactive
    }
}

/// The domination comparator (§4.2). Smaller is more preferred, so a
/// min-heap's top is always the current winner.
pub fn domination_cmp(a: &Match, b: &Match) -> Ordering {
    if a.regexp != b.regexp {
        // Matches of different regexes are incomparable; by convention they
        // compare equal (§4.2, §8 property 3).
        return Ordering::Equal;
    }
    match a.start.cmp(&b.start) {
        Ordering::Equal => b.end.cmp(&a.end), // longer end is preferred (smaller)
        ord => ord,
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        domination_cmp(self, other) == Ordering::Equal
    }
}
impl Eq for Match {}

impl PartialOrd for Match {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(domination_cmp(self, other))
    }
}

impl Ord for Match {
    fn cmp(&self, other: &Self) -> Ordering {
        domination_cmp(self, other)
    }
}

/// A per-regex priority queue over live matches, ordered by domination
/// (§4.5). Supports `add`, `remove(m)`, `peek`, `size`, all serialised by the
/// caller (the owning `Regexp`'s coarse-grained lock).
#[derive(Default)]
pub struct DominationHeap {
    // Binary min-heap stored as a flat array; `slot[i]` gives the current
    // array index of the match with that id, so `remove` can find and
    // sift without a linear scan.
    heap: Vec<Match>,
    slot: HashMap<MatchId, usize>,
}

impl DominationHeap {
    pub fn new() -> Self {
        DominationHeap {
            heap: Vec::new(),
            slot: HashMap::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.heap.len()
    }

    pub fn peek(&self) -> Option<&Match> {
        self.heap.first()
    }

    pub fn add(&mut self, m: Match) {
        let idx = self.heap.len();
        self.slot.insert(m.id(), idx);
        self.heap.push(m);
        self.sift_up(idx);
    }

    /// Removes and returns the match with id `id`, if present.
    pub fn remove(&mut self, id: MatchId) -> Option<Match> {
        let idx = *self.slot.get(&id)?;
        self.slot.remove(&id);
        let last = self.heap.len() - 1;
        self.heap.swap(idx, last);
        let removed = self.heap.pop().expect("heap nonempty");
        if idx < self.heap.len() {
            self.slot.insert(self.heap[idx].id(), idx);
            // The element that moved into `idx` could need to move either
            // way, so try both directions.
            self.sift_up(idx);
            self.sift_down(idx);
        }
        Some(removed)
    }

    /// Replaces the live copy of a match (e.g. after extending its `end`)
    /// with an updated one. Implemented as remove-then-add since §4.5 does
    /// not specify a distinct update primitive.
    pub fn reinsert(&mut self, updated: Match) {
        self.remove(updated.id());
        self.add(updated);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.heap[idx] < self.heap[parent] {
                self.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left = 2 * idx + 1;
            let right = 2 * idx + 2;
            let mut smallest = idx;
            if left < self.heap.len() && self.heap[left] < self.heap[smallest] {
                smallest = left;
            }
            if right < self.heap.len() && self.heap[right] < self.heap[smallest] {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest);
            idx = smallest;
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.slot.insert(self.heap[i].id(), i);
        self.slot.insert(self.heap[j].id(), j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::RegexpId;

    fn m(regexp: RegexpId, start: usize, end: usize) -> Match {
        let mut match_ = Match::new(regexp, start);
        match_.extend_to(end);
        match_
    }

    #[test]
    fn longer_end_wins_at_equal_start() {
        let r = RegexpId(0);
        let m1 = m(r, 0, 1);
        let m2 = m(r, 0, 3);
        assert_eq!(domination_cmp(&m2, &m1), Ordering::Less);
        assert_eq!(domination_cmp(&m1, &m2), Ordering::Greater);
    }

    #[test]
    fn earlier_start_wins() {
        let r = RegexpId(0);
        let m1 = m(r, 0, 5);
        let m2 = m(r, 1, 5);
        assert_eq!(domination_cmp(&m2, &m1), Ordering::Greater);
    }

    #[test]
    fn identical_endpoints_compare_equal() {
        let r = RegexpId(0);
        let m1 = m(r, 2, 4);
        let m2 = m(r, 2, 4);
        assert_eq!(domination_cmp(&m1, &m2), Ordering::Equal);
    }

    #[test]
    fn distinct_regexes_compare_equal() {
        let m1 = m(RegexpId(0), 0, 0);
        let m2 = m(RegexpId(1), 5, 9);
        assert_eq!(domination_cmp(&m1, &m2), Ordering::Equal);
    }

    #[test]
    fn heap_peek_is_most_preferred() {
        let r = RegexpId(0);
        let mut heap = DominationHeap::new();
        heap.add(m(r, 3, 3));
        heap.add(m(r, 1, 1));
        heap.add(m(r, 2, 7));
        assert_eq!(heap.peek().unwrap().start(), 1);
    }

    #[test]
    fn remove_by_id_is_logarithmic_and_correct() {
        let r = RegexpId(0);
        let mut heap = DominationHeap::new();
        let a = m(r, 5, 5);
        let b = m(r, 1, 1);
        let c = m(r, 3, 3);
        let (ia, ib, ic) = (a.id(), b.id(), c.id());
        heap.add(a);
        heap.add(b);
        heap.add(c);
        assert_eq!(heap.size(), 3);
        heap.remove(ib);
        assert_eq!(heap.size(), 2);
        assert_eq!(heap.peek().unwrap().id(), ic);
        heap.remove(ic);
        assert_eq!(heap.peek().unwrap().id(), ia);
        heap.remove(ia);
        assert!(heap.peek().is_none());
    }
}
