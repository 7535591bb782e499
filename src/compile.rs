// The parser collaborator (spec §6 "Parser collaborator", §9 "Polymorphism
// over node kinds").
//
// `compile(pattern, ...)` is the concrete instantiation of the opaque
// `compile(pattern, registry) → NFANode` interface §6 describes: it parses
// `pattern` with `regex-syntax` (the same parser crate the teacher's
// `program.rs` drove via `syntax::Expr::parse`) and performs a Thompson
// construction over the resulting `Hir` — the construction the teacher's own
// `nfa.rs` cites by name in its header comment (Russ Cox's article on
// Thompson NFA simulation) — producing explicit NFA nodes instead of the
// teacher's linear `Inst` program.
//
// Each sub-expression compiles to a *fragment*: a fresh start node and a
// fresh end node connected internally by epsilon edges. Concatenation wires
// one fragment's end to the next's start; alternation fans a new start/end
// pair out to/in from each branch; repetition unrolls bounded counts and
// loops back through epsilon edges for the unbounded tail. Only the overall
// fragment's end node is marked terminal — capture groups are accepted
// syntactically and flattened (no capture slots are produced, since §1 scopes
// capture groups out), and anchors/word-boundaries/backreferences are
// rejected as `ParseError::Unsupported` (see DESIGN.md, Open Question OQ-1).

use regex_syntax::hir::{Class, Hir, HirKind, Repetition};
use regex_syntax::Parser;

use crate::error::ParseError;
use crate::nfa::{NfaNodeId, NfaStore};
use crate::regexp::RegexpId;

/// Upper bound on the number of NFA nodes a single pattern may compile to,
/// mirroring the teacher's `Program::new(..., size_limit, ...)` guard
/// against pathological bounded-repetition blowups (e.g. `a{1000}{1000}`).
const MAX_NODES_PER_PATTERN: usize = 50_000;

/// A compiled NFA fragment: its single entry point (the rest of the
/// fragment's footprint lives in the NFA graph itself — which nodes are
/// active/terminal for this regex is read back off the graph per-`DfaNode`
/// during matching, not duplicated here; see `Regexp`'s doc comment).
pub struct Compiled {
    pub start: NfaNodeId,
    /// The pattern's maximal leading run of literal characters, if any
    /// (§4.3 Prefilter: "patterns without a usable literal prefix
    /// contribute a wildcard"). Only a leading `Concat`/`Literal` run is
    /// recognized; anything more elaborate (leading alternation, leading
    /// repetition) simply yields `None`, which is always sound — it just
    /// forgoes the prefilter optimisation for that pattern.
    pub literal_prefix: Option<String>,
}

/// The maximal leading run of literal characters in `hir`, if any. Only a
/// top-level `Literal` or a leading run of `Literal`s inside a top-level
/// `Concat` is recognized (e.g. `abc`, `abc(def)`, `abcd+`'s `abc` prefix
/// before the repetition). Anything else — leading alternation, leading
/// repetition, leading class — yields `None`.
fn leading_literal_prefix(hir: &Hir) -> Option<String> {
    match hir.kind() {
        HirKind::Literal(lit) => std::str::from_utf8(&lit.0).ok().map(str::to_string),
        HirKind::Concat(parts) => {
            let mut prefix = String::new();
            for part in parts {
                match part.kind() {
                    HirKind::Literal(lit) => match std::str::from_utf8(&lit.0) {
                        Ok(s) => prefix.push_str(s),
                        Err(_) => break,
                    },
                    _ => break,
                }
            }
            if prefix.is_empty() {
                None
            } else {
                Some(prefix)
            }
        }
        _ => None,
    }
}

/// Compiles `pattern` into a fresh NFA fragment owned by `owner`, registering
/// every constructed node with `nfa` (§6).
pub fn compile(pattern: &str, nfa: &NfaStore, owner: RegexpId) -> Result<Compiled, ParseError> {
    let hir = Parser::new()
        .parse(pattern)
        .map_err(|e| ParseError::Syntax {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

    let mut builder = Builder {
        nfa,
        owner,
        pattern,
        budget: MAX_NODES_PER_PATTERN,
    };
    let (start, end) = builder.compile_hir(&hir)?;
    nfa.set_terminal(end);

    let literal_prefix = leading_literal_prefix(&hir);

    Ok(Compiled { start, literal_prefix })
}

struct Builder<'a> {
    nfa: &'a NfaStore,
    owner: RegexpId,
    pattern: &'a str,
    budget: usize,
}

type Fragment = (NfaNodeId, NfaNodeId);

impl<'a> Builder<'a> {
    fn alloc(&mut self) -> Result<NfaNodeId, ParseError> {
        if self.budget == 0 {
            return Err(ParseError::Unsupported {
                pattern: self.pattern.to_string(),
                what: "pattern compiles to too many NFA states".to_string(),
            });
        }
        self.budget -= 1;
        Ok(self.nfa.alloc(Some(self.owner)))
    }

    fn unsupported(&self, what: &str) -> ParseError {
        ParseError::Unsupported {
            pattern: self.pattern.to_string(),
            what: what.to_string(),
        }
    }

    /// An empty fragment: matches the empty string, consumes nothing.
    fn empty(&mut self) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        self.nfa.add_epsilon(s, e);
        Ok((s, e))
    }

    fn literal_char(&mut self, ch: char) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        self.nfa.add_range(s, ch, ch, e);
        Ok((s, e))
    }

    fn class_fragment(&mut self, class: &Class) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        let mut added_any = false;
        match class {
            Class::Unicode(u) => {
                for range in u.ranges() {
                    self.nfa.add_range(s, range.start(), range.end(), e);
                    added_any = true;
                }
            }
            Class::Bytes(b) => {
                for range in b.ranges() {
                    // Byte classes outside the ASCII range aren't meaningful
                    // as single-character transitions in a Unicode-scalar
                    // engine; restrict to the ASCII subset they can express.
                    let lo = range.start();
                    let hi = range.end();
                    if lo <= 0x7F {
                        let hi = hi.min(0x7F);
                        self.nfa.add_range(s, lo as char, hi as char, e);
                        added_any = true;
                    }
                }
            }
        }
        // A class that contributes no edge at all (e.g. `(?-u)[\x80-\xff]`,
        // entirely outside the ASCII range this engine can express as
        // transitions) would otherwise compile to an unreachable dead-end
        // fragment that silently never matches anything; reject it instead
        // of letting `add` return `Ok(())` for a pattern that can never fire.
        if !added_any {
            return Err(self.unsupported("character class has no representable members"));
        }
        Ok((s, e))
    }

    fn concat(&mut self, fragments: Vec<Fragment>) -> Result<Fragment, ParseError> {
        if fragments.is_empty() {
            return self.empty();
        }
        let start = fragments[0].0;
        for window in fragments.windows(2) {
            self.nfa.add_epsilon(window[0].1, window[1].0);
        }
        let end = fragments[fragments.len() - 1].1;
        Ok((start, end))
    }

    fn alternation(&mut self, fragments: Vec<Fragment>) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        for (fs, fe) in fragments {
            self.nfa.add_epsilon(s, fs);
            self.nfa.add_epsilon(fe, e);
        }
        Ok((s, e))
    }

    /// Zero-or-more: loop the sub-fragment back on itself, with a bypass for
    /// the zero case.
    fn star(&mut self, sub: Fragment) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        self.nfa.add_epsilon(s, sub.0);
        self.nfa.add_epsilon(s, e);
        self.nfa.add_epsilon(sub.1, sub.0);
        self.nfa.add_epsilon(sub.1, e);
        Ok((s, e))
    }

    /// Zero-or-one: a bypass around the sub-fragment, no loop-back.
    fn optional(&mut self, sub: Fragment) -> Result<Fragment, ParseError> {
        let s = self.alloc()?;
        let e = self.alloc()?;
        self.nfa.add_epsilon(s, sub.0);
        self.nfa.add_epsilon(s, e);
        self.nfa.add_epsilon(sub.1, e);
        Ok((s, e))
    }

    fn repetition(&mut self, rep: &Repetition) -> Result<Fragment, ParseError> {
        let min = rep.min as usize;
        match rep.max {
            None => {
                // `sub{min,}`: min required copies, then a star of one more.
                let mut required = Vec::with_capacity(min + 1);
                for _ in 0..min {
                    required.push(self.compile_hir(&rep.sub)?);
                }
                let tail_sub = self.compile_hir(&rep.sub)?;
                let tail = self.star(tail_sub)?;
                required.push(tail);
                self.concat(required)
            }
            Some(max) => {
                let max = max as usize;
                if max < min {
                    return Err(self.unsupported("repetition with max < min"));
                }
                let mut parts = Vec::with_capacity(max);
                for _ in 0..min {
                    parts.push(self.compile_hir(&rep.sub)?);
                }
                for _ in min..max {
                    let sub = self.compile_hir(&rep.sub)?;
                    parts.push(self.optional(sub)?);
                }
                if parts.is_empty() {
                    self.empty()
                } else {
                    self.concat(parts)
                }
            }
        }
    }

    fn compile_hir(&mut self, hir: &Hir) -> Result<Fragment, ParseError> {
        match hir.kind() {
            HirKind::Empty => self.empty(),
            HirKind::Literal(lit) => {
                let text = std::str::from_utf8(&lit.0).map_err(|_| {
                    self.unsupported("literal is not valid UTF-8")
                })?;
                let chars: Vec<Fragment> = text
                    .chars()
                    .map(|c| self.literal_char(c))
                    .collect::<Result<_, _>>()?;
                self.concat(chars)
            }
            HirKind::Class(class) => self.class_fragment(class),
            HirKind::Look(_) => Err(self.unsupported("anchors and word boundaries")),
            HirKind::Repetition(rep) => self.repetition(rep),
            HirKind::Capture(cap) => self.compile_hir(&cap.sub),
            HirKind::Concat(parts) => {
                let fragments = parts
                    .iter()
                    .map(|p| self.compile_hir(p))
                    .collect::<Result<Vec<_>, _>>()?;
                self.concat(fragments)
            }
            HirKind::Alternation(branches) => {
                let fragments = branches
                    .iter()
                    .map(|b| self.compile_hir(b))
                    .collect::<Result<Vec<_>, _>>()?;
                self.alternation(fragments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::NfaStore;

    #[test]
    fn compiles_simple_literal_and_terminal_node_is_reachable() {
        let nfa = NfaStore::new();
        let compiled = compile("abc", &nfa, RegexpId(0)).unwrap();
        let mut closure = nfa.epsilon_closure([compiled.start]);
        for ch in "abc".chars() {
            let mut next = Vec::new();
            for id in closure.iter() {
                nfa.with_node(id, |n| next.extend(n.successors_on(ch)));
            }
            closure = nfa.epsilon_closure(next);
        }
        let is_terminal = closure.iter().any(|id| nfa.with_node(id, |n| n.is_terminal()));
        assert!(is_terminal, "consuming the full literal must reach a terminal node");
    }

    #[test]
    fn rejects_anchors() {
        let nfa = NfaStore::new();
        let err = compile("^a", &nfa, RegexpId(0)).unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn rejects_invalid_syntax() {
        let nfa = NfaStore::new();
        let err = compile("a(", &nfa, RegexpId(0)).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn literal_prefix_from_plain_literal() {
        let nfa = NfaStore::new();
        let compiled = compile("laden", &nfa, RegexpId(0)).unwrap();
        assert_eq!(compiled.literal_prefix.as_deref(), Some("laden"));
    }

    #[test]
    fn literal_prefix_stops_at_repetition() {
        let nfa = NfaStore::new();
        let compiled = compile("abc+d", &nfa, RegexpId(0)).unwrap();
        assert_eq!(compiled.literal_prefix.as_deref(), Some("ab"));
    }

    #[test]
    fn no_literal_prefix_for_leading_class() {
        let nfa = NfaStore::new();
        let compiled = compile("[ab]c", &nfa, RegexpId(0)).unwrap();
        assert_eq!(compiled.literal_prefix, None);
    }

    /// A byte class entirely outside the ASCII range this engine can express
    /// as char-range transitions must be rejected, not silently compiled to
    /// an unreachable dead-end fragment that can never match anything.
    #[test]
    fn rejects_byte_class_with_no_ascii_members() {
        let nfa = NfaStore::new();
        let err = compile(r"(?-u)[\x80-\xff]", &nfa, RegexpId(0)).unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }
}
