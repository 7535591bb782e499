// NFA Node Store (spec §4.1, §3 "NFA Node", §9 "tagged variants with a
// shared header").
//
// Where the teacher's `inst.rs` represents a single regex as a flat
// `Vec<Inst>` addressed by instruction index (`Split`/`Char`/`Save`/
// `EmptyLook`/`Match`), this module represents each regex as an explicit
// Thompson NFA: nodes own a character-range transition table plus an
// epsilon-successor list, tagged by id rather than threaded through a
// program counter. That shape is what subset construction (§4.1's
// `get_dfa_node`) needs: a `StateSet` is a set of these node ids, and basis
// equality must depend only on which ids are present, never on how a single
// regex's instructions happened to be laid out.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::regexp::RegexpId;
use crate::stateset::StateSet;

/// A dense, process-wide-unique identifier for an NFA node (§3: "ids are
/// unique process-wide").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NfaNodeId(pub u32);

impl NfaNodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single NFA node.
///
/// `ranges` is kept sorted by lower bound and need not be non-overlapping in
/// general (alternation inside a character class compiles to independent
/// edges), but the compiler is expected to merge adjacent/overlapping ranges
/// where cheap to do so.
#[derive(Debug)]
pub struct NfaNode {
    id: NfaNodeId,
    /// The regex that owns this node. `None` only for the distinguished
    /// Start Node (§2), which is owned by the `Matcher` itself.
    owner: Option<RegexpId>,
    terminal: bool,
    epsilon: Vec<NfaNodeId>,
    ranges: Vec<(char, char, NfaNodeId)>,
}

impl NfaNode {
    pub fn id(&self) -> NfaNodeId {
        self.id
    }

    pub fn owner(&self) -> Option<RegexpId> {
        self.owner
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn epsilon_successors(&self) -> &[NfaNodeId] {
        &self.epsilon
    }

    /// Character-driven successors reachable on `ch`.
    pub fn successors_on(&self, ch: char) -> impl Iterator<Item = NfaNodeId> + '_ {
        self.ranges
            .iter()
            .filter(move |&&(lo, hi, _)| lo <= ch && ch <= hi)
            .map(|&(_, _, to)| to)
    }
}

/// Interns per-regex NFA nodes and assigns each a dense integer id (§4.1).
///
/// One `NfaStore` is owned per `Matcher` (§3 ownership table); id uniqueness
/// only needs to hold within a single `Matcher`, so a plain `AtomicU32`
/// counter suffices without a process-global singleton (§9 "Globally shared
/// singletons").
pub struct NfaStore {
    nodes: RwLock<Vec<NfaNode>>,
    next_id: AtomicU32,
}

impl NfaStore {
    pub fn new() -> Self {
        NfaStore {
            nodes: RwLock::new(Vec::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Allocates a new node owned by `owner` (or the Start Node, if `None`).
    pub fn alloc(&self, owner: Option<RegexpId>) -> NfaNodeId {
        let id = NfaNodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = NfaNode {
            id,
            owner,
            terminal: false,
            epsilon: Vec::new(),
            ranges: Vec::new(),
        };
        let mut nodes = self.nodes.write();
        debug_assert_eq!(nodes.len(), id.index());
        nodes.push(node);
        id
    }

    pub fn add_epsilon(&self, from: NfaNodeId, to: NfaNodeId) {
        let mut nodes = self.nodes.write();
        nodes[from.index()].epsilon.push(to);
    }

    pub fn add_range(&self, from: NfaNodeId, lo: char, hi: char, to: NfaNodeId) {
        let mut nodes = self.nodes.write();
        let node = &mut nodes[from.index()];
        let pos = node.ranges.partition_point(|&(l, _, _)| l <= lo);
        node.ranges.insert(pos, (lo, hi, to));
    }

    pub fn set_terminal(&self, id: NfaNodeId) {
        self.nodes.write()[id.index()].terminal = true;
    }

    pub fn with_node<R>(&self, id: NfaNodeId, f: impl FnOnce(&NfaNode) -> R) -> R {
        let nodes = self.nodes.read();
        f(&nodes[id.index()])
    }

    /// The smallest superset of `seeds` closed under epsilon transitions
    /// (§GLOSSARY "ε-closure").
    pub fn epsilon_closure(&self, seeds: impl IntoIterator<Item = NfaNodeId>) -> StateSet {
        let mut closure = StateSet::new();
        let mut stack: Vec<NfaNodeId> = seeds.into_iter().collect();
        while let Some(id) = stack.pop() {
            if closure.contains(id) {
                continue;
            }
            closure.insert(id);
            self.with_node(id, |n| {
                for &eps in n.epsilon_successors() {
                    if !closure.contains(eps) {
                        stack.push(eps);
                    }
                }
            });
        }
        closure
    }
}

impl Default for NfaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_dense_ids() {
        let store = NfaStore::new();
        let a = store.alloc(None);
        let b = store.alloc(None);
        let c = store.alloc(None);
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));
    }

    #[test]
    fn successors_on_respects_ranges() {
        let store = NfaStore::new();
        let a = store.alloc(None);
        let b = store.alloc(None);
        store.add_range(a, 'a', 'z', b);
        let hits: Vec<_> = store.with_node(a, |n| n.successors_on('m').collect());
        assert_eq!(hits, vec![b]);
        let miss: Vec<_> = store.with_node(a, |n| n.successors_on('5').collect());
        assert!(miss.is_empty());
    }

    #[test]
    fn epsilon_successors_accumulate() {
        let store = NfaStore::new();
        let a = store.alloc(None);
        let b = store.alloc(None);
        let c = store.alloc(None);
        store.add_epsilon(a, b);
        store.add_epsilon(a, c);
        let eps = store.with_node(a, |n| n.epsilon_successors().to_vec());
        assert_eq!(eps, vec![b, c]);
    }

    #[test]
    fn epsilon_closure_follows_chains() {
        let store = NfaStore::new();
        let a = store.alloc(None);
        let b = store.alloc(None);
        let c = store.alloc(None);
        store.add_epsilon(a, b);
        store.add_epsilon(b, c);
        let closure = store.epsilon_closure(vec![a]);
        assert!(closure.contains(a));
        assert!(closure.contains(b));
        assert!(closure.contains(c));
        assert_eq!(closure.len(), 3);
    }
}
