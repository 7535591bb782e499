// MatchSet (spec §3 "A MatchSet exclusively owns its Matches", §4.3).
//
// One `MatchSet` exists per live starting position: it walks its own DFA
// state forward one node at a time and, for every regex active in that
// state, owns exactly one `Match` tracking that regex's current extent from
// this start. Ownership here is structural, not just logical: a `MatchSet`
// is the only thing that creates, extends, or retires the `Match`es born at
// its `start` — each `Regexp`'s domination heap only ever hears about them
// through the `register_match`/`update_match`/`discard_match` calls a
// `MatchSet` makes.
//
// Per regex there is at most one live `Match` per `MatchSet`, and `start`
// only ever increases as new `MatchSet`s are seeded, so within one regex's
// heap the earliest-born live match can never be outranked by one born
// later (§4.2): it is the heap minimum until it dies, at which point it
// either commits (if final) or is silently discarded, exposing whatever was
// born next.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Engine;
use crate::dfa::{DfaNode, DfaStore};
use crate::domination::Match;
use crate::nfa::{NfaNodeId, NfaStore};
use crate::regexp::{Regexp, RegexpId};

/// Advances one step through `dfa`, routing through [`DfaStore::next_dfa_fast`]
/// when `engine` is [`Engine::Fastpath`] and the portable path otherwise (§6
/// "engine ∈ {default, fastpath}"). `scratch` is the match loop's own
/// per-character successor buffer (§9 "each match loop owns its scratch
/// bitset and next-state array; no globals") — unused on the default path.
fn step(
    dfa: &DfaStore,
    nfa: &NfaStore,
    node: &Arc<DfaNode>,
    ch: char,
    engine: Engine,
    scratch: &mut Vec<NfaNodeId>,
) -> Arc<DfaNode> {
    match engine {
        Engine::Default => dfa.next_dfa(nfa, node, ch),
        Engine::Fastpath => dfa.next_dfa_fast(nfa, node, ch, scratch),
    }
}

/// Where to find the live `Regexp` for an id, without pulling in the whole
/// `Registry` type (keeps this module testable against a bare map).
pub trait RegexpLookup {
    fn regexp(&self, id: RegexpId) -> Arc<Regexp>;
}

/// A live matching attempt rooted at one input position.
pub struct MatchSet {
    start: usize,
    node: Arc<DfaNode>,
    tracked: HashMap<RegexpId, Match>,
}

impl MatchSet {
    /// Seeds a new `MatchSet` rooted at `start`, if consuming `ch` from the
    /// Start Node's own DFA node (`start_closure`, the ε-closure of just the
    /// Start Node) lands on a non-empty successor (§3 Lifecycles: "MatchSets
    /// are created when a character at position p transitions the Start Node
    /// onto a non-empty successor"; §4.3 steps 1/2). Returns `None` when the
    /// transition is dead, so the caller never has to track an empty
    /// `MatchSet`.
    pub fn seed(
        start: usize,
        start_closure: &Arc<DfaNode>,
        ch: char,
        nfa: &NfaStore,
        dfa: &DfaStore,
        registry: &impl RegexpLookup,
        engine: Engine,
        scratch: &mut Vec<NfaNodeId>,
    ) -> Option<Self> {
        let node = step(dfa, nfa, start_closure, ch, engine, scratch);
        if node.is_dead() {
            return None;
        }
        let mut tracked = HashMap::new();
        for regexp_id in node.active_regexps() {
            let mut m = Match::new(regexp_id, start);
            if node.is_terminal(regexp_id) {
                m.mark_final();
            }
            registry.regexp(regexp_id).register_match(m);
            tracked.insert(regexp_id, m);
        }
        Some(MatchSet { start, node, tracked })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Whether this `MatchSet` has no live attempts left and can be garbage
    /// collected (§4.3 "garbage-collect empty MatchSets").
    pub fn is_dead(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Advances this `MatchSet` past `ch`, which was just consumed to reach
    /// `pos` (i.e. `pos` is the position after `ch`). Regexes that fell out
    /// of the active set are retired (committing if final, discarded
    /// otherwise); regexes still active are extended; regexes newly active
    /// are seeded. `sink` receives every match that commits as a result.
    pub fn advance(
        &mut self,
        ch: char,
        pos: usize,
        nfa: &NfaStore,
        dfa: &DfaStore,
        registry: &impl RegexpLookup,
        engine: Engine,
        scratch: &mut Vec<NfaNodeId>,
        sink: &mut dyn FnMut(Match),
    ) {
        let next = step(dfa, nfa, &self.node, ch, engine, scratch);
        let mut still_tracked = HashMap::with_capacity(self.tracked.len());

        for (regexp_id, mut m) in self.tracked.drain() {
            let regexp = registry.regexp(regexp_id);
            if next.is_active(regexp_id) {
                m.extend_to(pos);
                if next.is_terminal(regexp_id) {
                    m.mark_final();
                }
                regexp.update_match(m, sink);
                still_tracked.insert(regexp_id, m);
            } else {
                Self::retire(&regexp, m, sink);
            }
        }

        for regexp_id in next.active_regexps() {
            if still_tracked.contains_key(&regexp_id) {
                continue;
            }
            let mut m = Match::new(regexp_id, self.start);
            m.extend_to(pos);
            if next.is_terminal(regexp_id) {
                m.mark_final();
            }
            registry.regexp(regexp_id).register_match(m);
            still_tracked.insert(regexp_id, m);
        }

        self.tracked = still_tracked;
        self.node = next;
    }

    /// Called once at end-of-input: every attempt still alive dies without
    /// extending further (§4.3 "end-of-input abandonment of non-final
    /// matches").
    pub fn finish(&mut self, registry: &impl RegexpLookup, sink: &mut dyn FnMut(Match)) {
        for (regexp_id, m) in self.tracked.drain() {
            let regexp = registry.regexp(regexp_id);
            Self::retire(&regexp, m, sink);
        }
    }

    fn retire(regexp: &Regexp, mut m: Match, sink: &mut dyn FnMut(Match)) {
        m.mark_inactive();
        if m.is_final() {
            regexp.update_match(m, sink);
        } else {
            regexp
                .discard_match(m.id(), sink)
                .expect("match tracked by this MatchSet must exist in its regex's heap");
        }
    }
}
