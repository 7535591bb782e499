// DFA Node Storage (spec §4.1, §3 "DFA Node").
//
// A `StateSet → DfaNode` map. Building a new `DfaNode` happens on first
// demand under a single lock that covers both the lookup map and the node
// arena, so two callers racing to materialize the same basis are guaranteed
// to observe the same node (§4.1 "Concurrency": at-most-one materialization
// per basis). Once created, a node's own per-character transition cache is
// guarded independently so that walking already-computed transitions never
// contends with materialization of an unrelated basis.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::nfa::NfaStore;
use crate::regexp::RegexpId;
use crate::stateset::StateSet;

/// Ids below this value are ASCII code points and get the flat-array cache
/// (§6 "ASCII fast-lane").
const ASCII_CACHE_LEN: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DfaNodeId(pub u32);

impl DfaNodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A DFA node: a memoised subset of NFA nodes, identified by its basis.
///
/// Two `DfaNode`s with equal basis are the same `Arc` (§3: "identity ==
/// equality of basis").
pub struct DfaNode {
    id: DfaNodeId,
    basis: StateSet,
    /// Regexes with some basis member belonging to them (§GLOSSARY
    /// "Active").
    active: std::collections::HashSet<RegexpId>,
    /// Regexes with some basis member that is an accept state (§GLOSSARY
    /// "Terminal").
    terminal: std::collections::HashSet<RegexpId>,
    transitions: RwLock<HashMap<char, DfaNodeId>>,
    /// ASCII-indexed transition cache for `Engine::Fastpath` (§6): a flat
    /// array avoids hashing a `char` for the overwhelmingly common case of
    /// ASCII input, at the cost of 128 extra words per materialised node.
    ascii_transitions: RwLock<[Option<DfaNodeId>; ASCII_CACHE_LEN]>,
}

impl DfaNode {
    pub fn id(&self) -> DfaNodeId {
        self.id
    }

    pub fn basis(&self) -> &StateSet {
        &self.basis
    }

    pub fn is_active(&self, regexp: RegexpId) -> bool {
        self.active.contains(&regexp)
    }

    pub fn is_terminal(&self, regexp: RegexpId) -> bool {
        self.terminal.contains(&regexp)
    }

    pub fn active_regexps(&self) -> impl Iterator<Item = RegexpId> + '_ {
        self.active.iter().copied()
    }

    pub fn terminal_regexps(&self) -> impl Iterator<Item = RegexpId> + '_ {
        self.terminal.iter().copied()
    }

    pub fn is_dead(&self) -> bool {
        self.basis.is_empty()
    }
}

struct Inner {
    index: HashMap<StateSet, DfaNodeId>,
    arena: Vec<Arc<DfaNode>>,
}

/// `StateSet → DfaNode` memoisation (§4.1).
pub struct DfaStore {
    inner: Mutex<Inner>,
}

impl DfaStore {
    pub fn new() -> Self {
        DfaStore {
            inner: Mutex::new(Inner {
                index: HashMap::new(),
                arena: Vec::new(),
            }),
        }
    }

    /// `get_dfa_node` (§4.1): returns the node whose basis equals `set`,
    /// materializing one if this is the first time `set` (as a canonical
    /// content, not representation) has been seen.
    pub fn get_dfa_node(&self, nfa: &NfaStore, set: StateSet) -> Arc<DfaNode> {
        let mut inner = self.inner.lock();
        if let Some(&id) = inner.index.get(&set) {
            return inner.arena[id.index()].clone();
        }
        let mut active = std::collections::HashSet::new();
        let mut terminal = std::collections::HashSet::new();
        for id in set.iter() {
            nfa.with_node(id, |n| {
                if let Some(regexp) = n.owner() {
                    active.insert(regexp);
                    if n.is_terminal() {
                        terminal.insert(regexp);
                    }
                }
            });
        }
        let new_id = DfaNodeId(inner.arena.len() as u32);
        let node = Arc::new(DfaNode {
            id: new_id,
            basis: set.clone(),
            active,
            terminal,
            transitions: RwLock::new(HashMap::new()),
            ascii_transitions: RwLock::new([None; ASCII_CACHE_LEN]),
        });
        inner.index.insert(set, new_id);
        inner.arena.push(node.clone());
        log::trace!(
            "materialized dfa node {:?} (basis size {})",
            new_id,
            node.basis.len()
        );
        node
    }

    fn by_id(&self, id: DfaNodeId) -> Arc<DfaNode> {
        self.inner.lock().arena[id.index()].clone()
    }

    /// The canonical empty DFA node (no live NFA nodes in the basis).
    pub fn empty(&self, nfa: &NfaStore) -> Arc<DfaNode> {
        self.get_dfa_node(nfa, StateSet::new())
    }

    /// `dfa.next_dfa(ch)` (§4.1): the node reached after consuming `ch` from
    /// `node`, computed on first demand and memoised thereafter on `node`
    /// itself.
    pub fn next_dfa(&self, nfa: &NfaStore, node: &Arc<DfaNode>, ch: char) -> Arc<DfaNode> {
        if let Some(&cached) = node.transitions.read().get(&ch) {
            return self.by_id(cached);
        }
        let mut successors = Vec::new();
        for id in node.basis.iter() {
            nfa.with_node(id, |n| successors.extend(n.successors_on(ch)));
        }
        let closure = nfa.epsilon_closure(successors);
        let next = self.get_dfa_node(nfa, closure);
        node.transitions.write().insert(ch, next.id);
        next
    }

    /// The `Engine::Fastpath` counterpart to [`next_dfa`](Self::next_dfa):
    /// ASCII characters are memoised in `node`'s flat array instead of its
    /// `HashMap`, skipping a hash of `ch` entirely, and the successor
    /// collection buffer is supplied by the caller's match loop rather than
    /// allocated fresh on every miss (§6; §9 "each match loop owns its
    /// scratch bitset and next-state array; no globals").
    pub fn next_dfa_fast(
        &self,
        nfa: &NfaStore,
        node: &Arc<DfaNode>,
        ch: char,
        scratch: &mut Vec<NfaNodeId>,
    ) -> Arc<DfaNode> {
        if ch.is_ascii() {
            if let Some(cached) = node.ascii_transitions.read()[ch as usize] {
                return self.by_id(cached);
            }
        } else if let Some(&cached) = node.transitions.read().get(&ch) {
            return self.by_id(cached);
        }
        scratch.clear();
        for id in node.basis.iter() {
            nfa.with_node(id, |n| scratch.extend(n.successors_on(ch)));
        }
        let closure = nfa.epsilon_closure(scratch.iter().copied());
        let next = self.get_dfa_node(nfa, closure);
        if ch.is_ascii() {
            node.ascii_transitions.write()[ch as usize] = Some(next.id);
        } else {
            node.transitions.write().insert(ch, next.id);
        }
        next
    }
}

impl Default for DfaStore {
    fn default() -> Self {
        Self::new()
    }
}
