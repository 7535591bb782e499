//! Simultaneous matching of large regex sets against a single input stream.
//!
//! A [`Matcher`] is built up with [`Matcher::add`], then driven once to
//! completion over an input with [`Matcher::exec`]. Every attached action
//! fires at most once per pattern per non-overlapping, leftmost-longest-style
//! match, in non-decreasing start-position order.
//!
//! The crate is organized the way the match engine is specified internally:
//! NFA construction (`compile`, `nfa`) feeds DFA node memoisation (`dfa`,
//! `stateset`), which the match engine (`matchset`) walks one character at a
//! time, applying the domination protocol (`domination`) through the
//! `regexp` registry and handing winners to the `sink`. An optional
//! `prefilter` suppresses work when the registered pattern count is large.
//! None of that machinery is public (§6 "External Interfaces" names only the
//! `Matcher` façade and its Parser/Buffer/Action collaborators; §3's
//! Ownership section has the `Matcher` "exclusively own" the registry and
//! NFA/DFA storage) — the only supported way to drive the engine is through
//! [`Matcher`] itself.

mod compile;
mod config;
mod dfa;
mod domination;
mod error;
mod input;
mod matchset;
mod nfa;
mod prefilter;
mod regexp;
mod sink;
mod stateset;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

pub use config::{Engine, MatcherConfig, Prefilter};
pub use error::{ConfigurationError, ParseError, RegistryConflict};
pub use input::{Buffer, StrBuffer};
pub use regexp::{Action, RegexpId};

use dfa::DfaStore;
use matchset::{MatchSet, RegexpLookup};
use nfa::{NfaNodeId, NfaStore};
use prefilter::PrefilterState;
use regexp::{Regexp, Registry};
use sink::RunnableSink;

/// The Matcher façade (spec §6 "Matcher façade").
///
/// Owns the Regexp registry, NFA node store, DFA node storage, the
/// distinguished Start Node, and the optional prefilter (§3 "Ownership").
/// Safe to share across threads for concurrent *construction* ([`add`]);
/// matching a single input ([`exec`]) is itself single-threaded over that
/// input, per §5 — nothing prevents two threads from calling `exec` with two
/// different buffers concurrently against the same `Matcher`, since all
/// shared state underneath is independently synchronised.
///
/// [`add`]: Matcher::add
/// [`exec`]: Matcher::exec
pub struct Matcher {
    nfa: NfaStore,
    dfa: DfaStore,
    registry: Registry,
    start_node: NfaNodeId,
    config: MatcherConfig,
    prefilter: Mutex<PrefilterState>,
    /// Bumped on every successful `add`, so a shared [`PrefilterState`] knows
    /// when it must rebuild (§3 PrefilterState).
    generation: AtomicU64,
    /// Serialises `add` end-to-end (compile + register) so that two
    /// concurrent `add`s of the same pattern text can never both decide to
    /// compile it (§5: "`add` is serialised per pattern"; here, coarsened to
    /// the whole registry rather than keyed per pattern string, which is a
    /// simplification documented in DESIGN.md).
    add_lock: Mutex<()>,
}

struct RegistryRef<'a>(&'a Registry);

impl<'a> RegexpLookup for RegistryRef<'a> {
    fn regexp(&self, id: RegexpId) -> Arc<Regexp> {
        self.0.get(id)
    }
}

impl Matcher {
    /// A `Matcher` with default configuration (§6: default prefilter `Aho`
    /// at [`config::DEFAULT_PREFILTER_THRESHOLD`], engine `Default`).
    pub fn new() -> Self {
        Self::with_config(MatcherConfig::default())
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        let nfa = NfaStore::new();
        let start_node = nfa.alloc(None);
        Matcher {
            nfa,
            dfa: DfaStore::new(),
            registry: Registry::new(),
            start_node,
            config,
            prefilter: Mutex::new(PrefilterState::empty()),
            generation: AtomicU64::new(0),
            add_lock: Mutex::new(()),
        }
    }

    /// Builds a `Matcher` from string configuration selections, as a host
    /// driver reading CLI flags or environment variables would (§6
    /// Configuration; §7 "ConfigurationError... surfaced at Matcher
    /// construction").
    pub fn from_selections(
        engine: &str,
        prefilter: &str,
        prefilter_threshold: u32,
    ) -> Result<Self, ConfigurationError> {
        let config = MatcherConfig::from_selections(engine, prefilter, prefilter_threshold)?;
        Ok(Self::with_config(config))
    }

    /// `add(pattern, action)` (§6, §4.2): compiles `pattern` if it has not
    /// been seen before, wires its start NFA node to the Start Node via an
    /// ε-edge, and attaches `action` to the resulting (possibly
    /// newly-created) `Regexp`. Returns `ParseError` on invalid or
    /// unsupported syntax without disturbing any previously registered
    /// pattern (§7).
    pub fn add(&self, pattern: &str, action: Action) -> Result<(), ParseError> {
        let _guard = self.add_lock.lock();
        if let Some(existing) = self.registry.lookup(pattern) {
            existing.attach_action(action);
            log::debug!("pattern `{}` already registered; action attached", pattern);
            return Ok(());
        }
        let id = self.registry.reserve_id();
        let compiled = compile::compile(pattern, &self.nfa, id)?;
        self.nfa.add_epsilon(self.start_node, compiled.start);
        self.registry.insert_reserved(
            id,
            pattern.to_string(),
            compiled.start,
            compiled.literal_prefix,
            action,
        );
        self.generation.fetch_add(1, Ordering::SeqCst);
        log::info!("registered pattern #{} `{}`", id.0, pattern);
        Ok(())
    }

    pub fn pattern_count(&self) -> usize {
        self.registry.len()
    }

    fn prefilter_active(&self) -> bool {
        self.config.prefilter == Prefilter::Aho
            && self.registry.len() as u32 >= self.config.prefilter_threshold
    }

    /// `match(buffer)` (§6): runs the engine to completion over `buffer`,
    /// invoking every attached action exactly once per committed match, in
    /// non-decreasing `start` order (ties broken by registration order,
    /// §4.3). Named `exec` because `match` is a reserved word.
    pub fn exec(&self, buffer: &mut dyn Buffer) {
        let start_closure = self.nfa.epsilon_closure([self.start_node]);
        let start_dfa = self.dfa.get_dfa_node(&self.nfa, start_closure);

        let prefilter_on = self.prefilter_active();
        if prefilter_on {
            self.prefilter
                .lock()
                .refresh(&self.registry, self.generation.load(Ordering::SeqCst));
        }

        let registry_ref = RegistryRef(&self.registry);
        let mut sets: Vec<MatchSet> = Vec::new();
        let mut sink = RunnableSink::new();
        // This match loop's own scratch successor buffer (§9 "each match loop
        // owns its scratch bitset and next-state array; no globals"); only
        // consulted by `Engine::Fastpath`.
        let mut scratch: Vec<nfa::NfaNodeId> = Vec::new();

        while buffer.has_next() {
            let p = buffer.current_pos();
            let gate = !prefilter_on || self.prefilter.lock().possible_at(&*buffer, p);
            let ch = buffer.next();

            for set in sets.iter_mut() {
                set.advance(
                    ch,
                    p,
                    &self.nfa,
                    &self.dfa,
                    &registry_ref,
                    self.config.engine,
                    &mut scratch,
                    &mut |m| sink.push(m),
                );
            }

            // Seeded after the existing sets are advanced, the reverse of
            // §4.3 steps 2/3's listed order — deliberately: `seed` already
            // consumes `ch` while constructing the new set (it calls
            // `next_dfa`/`next_dfa_fast` on the Start Node's own DFA node, the
            // same way `advance` does for a live set), so a set seeded this
            // iteration is already up to date through `p`. Looping it through
            // `advance` as well in this same pass would consume `ch` twice.
            if gate {
                if let Some(new_set) = MatchSet::seed(
                    p,
                    &start_dfa,
                    ch,
                    &self.nfa,
                    &self.dfa,
                    &registry_ref,
                    self.config.engine,
                    &mut scratch,
                ) {
                    sets.push(new_set);
                }
            } else {
                log::trace!("prefilter suppressed seeding at position {}", p);
            }

            sets.retain(|s| !s.is_dead());

            let watermark = sets.iter().map(MatchSet::start).min().unwrap_or(p + 1);
            sink.flush_below(watermark, &self.registry, &*buffer);
        }

        for set in sets.iter_mut() {
            set.finish(&registry_ref, &mut |m| sink.push(m));
        }
        sink.flush_all(&self.registry, &*buffer);
    }

    /// `shutdown()` (§6): quiesces pending work. The core has no background
    /// threads or async machinery (§9 "the core is synchronous"), so by the
    /// time `exec` returns there is nothing left pending; this exists to
    /// satisfy the façade contract for hosts that call it defensively.
    pub fn shutdown(&self) {
        log::debug!("matcher shutdown; no further actions will fire");
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}
