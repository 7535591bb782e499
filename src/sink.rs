// The Runnable-Matches Sink (spec §2 "Runnable-Matches Sink", §4.3
// "Ordering guarantee", SPEC_FULL §B.5).
//
// Commits surface from whichever `MatchSet` produced them in whatever order
// the per-character loop happens to walk its live sets, which is not
// necessarily `start` order: a `MatchSet` seeded later can finalize sooner
// than one seeded earlier, if the earlier one's regex still needs more
// input. This sink buffers commits in a small heap keyed by `(start, regex
// id)` and releases a commit only once nothing still live could ever precede
// it — i.e. once every remaining live `MatchSet`'s own `start` is already
// past the buffered entry's `start`. The `Matcher`'s match loop recomputes
// that watermark once per character and flushes below it; at end-of-input it
// flushes everything outright.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domination::Match;
use crate::input::Buffer;
use crate::regexp::Registry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SinkKey {
    start: usize,
    regexp: u32,
}

struct Entry {
    key: SinkKey,
    m: Match,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so a std `BinaryHeap` (a max-heap) surfaces the smallest
        // key — the earliest `start`, then lowest regex id — at its peek.
        other.key.cmp(&self.key)
    }
}

/// A deduplicating, in-order collector for committed matches (§2).
pub struct RunnableSink {
    buffered: BinaryHeap<Entry>,
}

impl RunnableSink {
    pub fn new() -> Self {
        RunnableSink {
            buffered: BinaryHeap::new(),
        }
    }

    /// Buffers a freshly committed match; not yet fired.
    pub fn push(&mut self, m: Match) {
        let key = SinkKey {
            start: m.start(),
            regexp: m.regexp().0,
        };
        self.buffered.push(Entry { key, m });
    }

    /// Fires every buffered commit whose `start` is strictly less than
    /// `watermark`, in `(start, regex id)` order.
    pub fn flush_below(&mut self, watermark: usize, registry: &Registry, buffer: &dyn Buffer) {
        while let Some(top) = self.buffered.peek() {
            if top.key.start >= watermark {
                break;
            }
            let entry = self.buffered.pop().expect("just peeked");
            Self::fire(registry, buffer, entry.m);
        }
    }

    /// Unconditionally fires every remaining buffered commit, in
    /// `(start, regex id)` order (§4.3 "must flush at end-of-input").
    pub fn flush_all(&mut self, registry: &Registry, buffer: &dyn Buffer) {
        while let Some(entry) = self.buffered.pop() {
            Self::fire(registry, buffer, entry.m);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }

    fn fire(registry: &Registry, buffer: &dyn Buffer, m: Match) {
        let regexp = registry.get(m.regexp());
        regexp.perform_actions(buffer, m.start(), m.end());
    }
}

impl Default for RunnableSink {
    fn default() -> Self {
        Self::new()
    }
}
