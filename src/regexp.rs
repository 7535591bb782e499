// The Regexp registry (spec §2 "Regexp Registry", §3 "Regexp", §4.2).
//
// Each unique pattern string maps to exactly one `Regexp`, tracking its
// attached actions, its active/terminal NFA node sets, and its live matches'
// domination heap. Per §5, writers to the pattern→Regexp map are serialised
// per pattern and readers see completed `Regexp`s atomically; per-Regexp
// state is serialised per Regexp (coarse-grained mutual exclusion, since
// contention here is per-pattern, not global) using `parking_lot::Mutex`,
// matching the concurrency primitive `foundry` uses throughout the pack.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::domination::{DominationHeap, Match, MatchId};
use crate::error::RegistryConflict;
use crate::input::Buffer;
use crate::nfa::NfaNodeId;

/// A dense, process-wide-unique identifier for a registered pattern,
/// doubling as its registration order (§4.3 "Ordering guarantee": commits of
/// matches with equal `start` fire in Regexp-id order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegexpId(pub u32);

/// A user-supplied side effect invoked once per commit (§6 "Action
/// collaborator"). Receives the buffer and the inclusive `[start, end]`
/// character range of the committed match.
pub type Action = Arc<dyn Fn(&dyn Buffer, usize, usize) + Send + Sync>;

struct LiveState {
    heap: DominationHeap,
    /// The end position through which a committed match has already claimed
    /// this regex's output (§1 "non-overlapping... matches per expression").
    /// Any later match whose `start` falls at or before this position
    /// overlaps ground an earlier, strongly-preferred match already won, and
    /// must never itself commit even if it separately reaches the heap
    /// minimum once the winner has been removed.
    claimed_until: Option<usize>,
}

/// One registered pattern: its compiled NFA fragment's footprint, attached
/// actions, and live-match domination heap.
///
/// §3's Regexp row also lists per-regex "active"/"terminal" NFA node sets as
/// attributes, but the match loop never needs a whole-regex footprint: it
/// only ever asks an already-materialized `DfaNode` (matchset.rs) which
/// regexes are active/terminal *at that node*, so this struct does not
/// duplicate that bookkeeping — `DfaNode::active_regexps`/`is_active` are the
/// sole source of truth.
pub struct Regexp {
    id: RegexpId,
    pattern: String,
    start_node: NfaNodeId,
    actions: RwLock<Vec<Action>>,
    /// This pattern's maximal leading literal run, if any (§4.3 Prefilter).
    literal_prefix: Option<String>,
    live: Mutex<LiveState>,
}

impl Regexp {
    pub fn id(&self) -> RegexpId {
        self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn start_node(&self) -> NfaNodeId {
        self.start_node
    }

    /// This pattern's maximal leading literal run, if any (§4.3 Prefilter;
    /// `None` means this pattern contributes a wildcard to the prefilter).
    pub fn literal_prefix(&self) -> Option<&str> {
        self.literal_prefix.as_deref()
    }

    /// `register_match(m)` (§4.2): add a freshly seeded `m` to the live-match
    /// heap. A fresh match is never final, so it cannot itself be committed,
    /// but since starts only ever increase as the engine scans forward, a
    /// brand-new match also never usurps the current heap minimum.
    pub fn register_match(&self, m: Match) {
        self.live.lock().heap.add(m);
    }

    /// `update_match(m, sink)` (§4.2 "Commit rule"): reinsert `m`'s latest
    /// flags/extent into the heap, then drain every now-committable match
    /// off the front.
    ///
    /// Per regex, at most one `Match` is ever live for a given `start`
    /// (a `MatchSet` tracks one `Match` per regex and extends it in place),
    /// so the heap minimum is exactly the earliest-born live match — nothing
    /// born later can ever outrank it. The moment that earliest match is
    /// both final and inactive it is the permanent winner for its start and
    /// commits immediately; this may in turn expose an *already*
    /// final-and-inactive match that had been sitting behind it, so the
    /// drain continues until the new minimum is still pending.
    pub fn update_match(&self, m: Match, sink: &mut dyn FnMut(Match)) {
        let mut live = self.live.lock();
        live.heap.reinsert(m);
        Self::drain(&mut live, sink);
    }

    /// Removes `m` without ever committing it (it reached end-of-input or a
    /// DFA dead end without becoming final, so no action may fire for it).
    /// Still drains the heap afterward: `m` may have been blocking an
    /// already-resolved match behind it.
    pub fn discard_match(&self, id: MatchId, sink: &mut dyn FnMut(Match)) -> Result<(), RegistryConflict> {
        let mut live = self.live.lock();
        live.heap
            .remove(id)
            .ok_or(RegistryConflict::UnknownMatch(id, self.id))?;
        Self::drain(&mut live, sink);
        Ok(())
    }

    /// Pops every already-resolved (`inactive`) match off the front of the
    /// heap. Each one either commits — it is final, and its `start` is past
    /// whatever an earlier, strongly-preferred match for this regex already
    /// claimed — or is silently dropped: either it never reached a terminal
    /// node, or an earlier match starting no later than it already won and
    /// this one overlaps that win (§1 non-overlapping matches; §4.2 "earlier
    /// start strongly preferred"). A match still live (not yet `inactive`)
    /// always stops the drain, since its eventual fate is still undecided.
    fn drain(live: &mut LiveState, sink: &mut dyn FnMut(Match)) {
        while let Some(top) = live.heap.peek() {
            if !top.is_inactive() {
                break;
            }
            let top = *top;
            live.heap.remove(top.id());
            let overlaps_prior_win = live
                .claimed_until
                .is_some_and(|claimed| top.start() <= claimed);
            if top.is_final() && !overlaps_prior_win {
                live.claimed_until = Some(live.claimed_until.map_or(top.end(), |c| c.max(top.end())));
                sink(top);
            }
        }
    }

    pub fn heap_peek(&self) -> Option<Match> {
        self.live.lock().heap.peek().copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().heap.size()
    }

    /// `perform_actions(buffer, start, end)` (§4.2): invoke every attached
    /// action once.
    pub fn perform_actions(&self, buffer: &dyn Buffer, start: usize, end: usize) {
        for action in self.actions.read().iter() {
            action(buffer, start, end);
        }
    }

    /// Attaches an additional action to an already-registered pattern
    /// (spec §4.2 `add`: re-adding a known pattern string just attaches the
    /// new action, it does not recompile).
    pub(crate) fn attach_action(&self, action: Action) {
        self.actions.write().push(action);
    }
}

/// Indexes each pattern string to its `Regexp`, the pattern→Regexp half of
/// §2's "Regexp Registry" (the NFA-construction half lives in
/// [`crate::compile`]).
pub struct Registry {
    by_pattern: RwLock<HashMap<String, RegexpId>>,
    arena: RwLock<Vec<Arc<Regexp>>>,
    next_id: AtomicU32,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            by_pattern: RwLock::new(HashMap::new()),
            arena: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Returns the existing `Regexp` for `pattern`, if any.
    pub fn lookup(&self, pattern: &str) -> Option<Arc<Regexp>> {
        let id = *self.by_pattern.read().get(pattern)?;
        Some(self.arena.read()[id.0 as usize].clone())
    }

    /// Reserves the next dense `RegexpId`, so the compiler can tag a new
    /// pattern's NFA nodes with their final owning id before the `Regexp`
    /// itself exists (compilation needs an owner id; registration needs the
    /// compiled footprint — this breaks that cycle). Callers that reserve an
    /// id must follow up with [`Registry::insert_reserved`] using that same
    /// id; the two are expected to be called under an external lock that
    /// serialises `add` per §5 ("`add` is serialised per pattern").
    pub fn reserve_id(&self) -> RegexpId {
        RegexpId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Registers a freshly compiled pattern under the id `reserve_id`
    /// returned. Callers are expected to have already checked `lookup`
    /// (compilation happens before registration, so that a `ParseError`
    /// never partially registers a pattern).
    pub fn insert_reserved(
        &self,
        id: RegexpId,
        pattern: String,
        start_node: NfaNodeId,
        literal_prefix: Option<String>,
        action: Action,
    ) -> Arc<Regexp> {
        let regexp = Arc::new(Regexp {
            id,
            pattern: pattern.clone(),
            start_node,
            actions: RwLock::new(vec![action]),
            literal_prefix,
            live: Mutex::new(LiveState {
                heap: DominationHeap::new(),
                claimed_until: None,
            }),
        });
        let mut arena = self.arena.write();
        debug_assert_eq!(arena.len(), id.0 as usize, "RegexpId must match arena slot");
        arena.push(regexp.clone());
        self.by_pattern.write().insert(pattern, id);
        log::debug!("registered regex {:?} as pattern #{}", regexp.pattern(), id.0);
        regexp
    }

    pub fn get(&self, id: RegexpId) -> Arc<Regexp> {
        self.arena.read()[id.0 as usize].clone()
    }

    pub fn len(&self) -> usize {
        self.arena.read().len()
    }

    pub fn iter(&self) -> Vec<Arc<Regexp>> {
        self.arena.read().clone()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
