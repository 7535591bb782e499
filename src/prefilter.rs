// The literal-prefix prefilter (spec §4.3 "Prefilter", §2 "Prefilter",
// §3 "PrefilterState").
//
// The teacher's own `literals.rs` already chose, for a single regex, between
// a byte scan, a sparse byte set, Boyer-Moore-Horspool, or a full/sparse
// Aho-Corasick automaton depending on how many literal alternates a pattern
// had. This module generalizes that idea one level: instead of alternates of
// one pattern, the literals here are the leading literal runs of *every*
// registered pattern (`Regexp::literal_prefix`, computed by
// [`crate::compile`]), searched with a single multi-pattern Aho-Corasick
// automaton keyed by nothing more than "did any literal start here".
//
// The prefilter is a sound negative oracle only: `possible_at` may say
// "no pattern can start here" and be trusted, but a `true` answer never rules
// anything in or out. Patterns without a usable literal prefix (an
// unanchored class, alternation, or repetition at the very start) force the
// oracle to answer `true` everywhere, per §4.3's explicit guidance to treat
// that case conservatively rather than guess.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, Anchored, Input, MatchKind, StartKind};

use crate::input::Buffer;
use crate::regexp::Registry;

/// Prefilter state built from the current registry contents. Rebuilt lazily
/// whenever the set of registered patterns changes (tracked by a generation
/// counter the [`crate::Matcher`] bumps on every successful `add`, playing
/// the role of §3's "last-input-position scanned" bookkeeping field, except
/// here it is "last pattern-set generation built for" since this prefilter
/// answers a pattern-set-wide question rather than walking the input itself).
pub struct PrefilterState {
    automaton: Option<AhoCorasick>,
    /// `true` if some registered pattern has no literal prefix, forcing the
    /// oracle to answer `true` at every position regardless of `automaton`.
    wildcard: bool,
    max_prefix_chars: usize,
    built_for_generation: u64,
}

impl PrefilterState {
    pub fn empty() -> Self {
        PrefilterState {
            automaton: None,
            wildcard: false,
            max_prefix_chars: 0,
            built_for_generation: 0,
        }
    }

    /// Rebuilds the automaton from `registry`'s current contents if it
    /// hasn't already been built for `generation`.
    pub fn refresh(&mut self, registry: &Registry, generation: u64) {
        if self.built_for_generation == generation {
            return;
        }
        let mut literals = Vec::new();
        let mut wildcard = false;
        let mut max_prefix_chars = 0;
        for regexp in registry.iter() {
            match regexp.literal_prefix() {
                Some(lit) if !lit.is_empty() => {
                    max_prefix_chars = max_prefix_chars.max(lit.chars().count());
                    literals.push(lit.to_string());
                }
                _ => wildcard = true,
            }
        }
        self.automaton = if literals.is_empty() {
            None
        } else {
            AhoCorasickBuilder::new()
                .match_kind(MatchKind::LeftmostLongest)
                .start_kind(StartKind::Anchored)
                .build(&literals)
                .ok()
        };
        self.wildcard = wildcard;
        self.max_prefix_chars = max_prefix_chars;
        self.built_for_generation = generation;
        log::debug!(
            "prefilter rebuilt for generation {}: {} literals, wildcard={}",
            generation,
            literals.len(),
            wildcard
        );
    }

    /// Whether some registered pattern could possibly begin at character
    /// position `pos` of `buffer` (§4.3 step 1). Always sound in the sense
    /// required by §4.3: a `false` return guarantees no pattern begins at
    /// `pos`; a `true` return is never incorrect, merely uninformative.
    pub fn possible_at(&self, buffer: &dyn Buffer, pos: usize) -> bool {
        if self.wildcard {
            return true;
        }
        let Some(automaton) = &self.automaton else {
            // No patterns at all contributed a literal prefix and none are
            // wildcards, which only happens when nothing is registered.
            return false;
        };
        match buffer.peek_str(pos, self.max_prefix_chars) {
            None => true,
            Some(window) => {
                let input = Input::new(window.as_bytes()).anchored(Anchored::Yes);
                automaton.find(input).is_some()
            }
        }
    }
}

impl Default for PrefilterState {
    fn default() -> Self {
        Self::empty()
    }
}
