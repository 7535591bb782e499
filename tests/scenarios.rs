// End-to-end scenarios S1-S6 and the cross-cutting properties from spec §8,
// driven only through the public `Matcher` façade. Placed in `tests/` rather
// than `#[cfg(test)]` modules since these exercise the whole crate as a black
// box rather than one module's internals (SPEC_FULL §A "Test tooling").

use std::sync::{Arc, Mutex};

use manyregex::{Matcher, MatcherConfig, Prefilter, StrBuffer};

fn recorder() -> (Arc<Mutex<Vec<(usize, usize)>>>, manyregex::Action) {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let hits_clone = hits.clone();
    let action: manyregex::Action = Arc::new(move |_, s, e| hits_clone.lock().unwrap().push((s, e)));
    (hits, action)
}

#[test]
fn s1_a_plus_on_aaa_commits_once() {
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("a+", action).unwrap();
    let mut buffer = StrBuffer::new("aaa");
    matcher.exec(&mut buffer);
    assert_eq!(*hits.lock().unwrap(), vec![(0, 2)]);
}

#[test]
fn s2_a_plus_on_ababaab() {
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("a+", action).unwrap();
    let mut buffer = StrBuffer::new("ababaab");
    matcher.exec(&mut buffer);
    assert_eq!(*hits.lock().unwrap(), vec![(0, 0), (2, 2), (4, 5)]);
}

#[test]
fn s3_a_plus_on_bab() {
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("a+", action).unwrap();
    let mut buffer = StrBuffer::new("bab");
    matcher.exec(&mut buffer);
    assert_eq!(*hits.lock().unwrap(), vec![(1, 1)]);
}

#[test]
fn s4_den_laden_ll_on_prose_line() {
    let matcher = Matcher::new();
    let (den_hits, den_action) = recorder();
    let (laden_hits, laden_action) = recorder();
    let (ll_hits, ll_action) = recorder();
    matcher.add("den", den_action).unwrap();
    matcher.add("laden", laden_action).unwrap();
    matcher.add("ll", ll_action).unwrap();

    let text = "lly\ndrawn by heavy cart-horses and laden";
    let mut buffer = StrBuffer::new(text);
    matcher.exec(&mut buffer);

    assert!(!den_hits.lock().unwrap().is_empty(), "den must commit at least once");
    assert!(!laden_hits.lock().unwrap().is_empty(), "laden must commit at least once");
    assert_eq!(*ll_hits.lock().unwrap(), vec![(0, 1)], "ll commits at position 0-1");
}

#[test]
fn s5_three_any_char_patterns_fire_in_registration_order() {
    let matcher = Matcher::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3u32 {
        let order = order.clone();
        let action: manyregex::Action = Arc::new(move |_, s, e| order.lock().unwrap().push((i, s, e)));
        matcher.add(".+", action).unwrap();
    }
    let mut buffer = StrBuffer::new("a");
    matcher.exec(&mut buffer);
    assert_eq!(*order.lock().unwrap(), vec![(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
}

#[test]
fn s6_large_pattern_set_agrees_with_and_without_prefilter() {
    let text = "pattern00042 appears here, and pattern04999 appears here too, \
                but most of these 5000 literal patterns never show up at all."
        .repeat(20);

    let run = |prefilter: Prefilter, threshold: u32| -> Vec<(u32, usize, usize)> {
        let config = MatcherConfig::new()
            .with_prefilter(prefilter)
            .with_prefilter_threshold(threshold)
            .unwrap();
        let matcher = Matcher::with_config(config);
        let hits = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5_000u32 {
            let hits = hits.clone();
            let action: manyregex::Action = Arc::new(move |_, s, e| hits.lock().unwrap().push((i, s, e)));
            matcher.add(&format!("pattern{i:05}"), action).unwrap();
        }
        let mut buffer = StrBuffer::new(&text);
        matcher.exec(&mut buffer);
        let mut hits = hits.lock().unwrap().clone();
        hits.sort();
        hits
    };

    let without = run(Prefilter::None, 1_000);
    let with = run(Prefilter::Aho, 1_000);
    assert_eq!(without, with, "committed triples must not depend on prefilter activation");
    assert!(!without.is_empty());
}

#[test]
fn end_of_input_abandonment_yields_zero_commits() {
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("abcdef", action).unwrap();
    let mut buffer = StrBuffer::new("abc");
    matcher.exec(&mut buffer);
    assert!(hits.lock().unwrap().is_empty());
}

#[test]
fn commits_are_emitted_in_non_decreasing_start_order() {
    let matcher = Matcher::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for pattern in ["fox", "dog", "lazy", "quick"] {
        let order = order.clone();
        let action: manyregex::Action = Arc::new(move |_, s, _| order.lock().unwrap().push(s));
        matcher.add(pattern, action).unwrap();
    }
    let mut buffer = StrBuffer::new("the quick brown fox jumps over the lazy dog");
    matcher.exec(&mut buffer);
    let starts = order.lock().unwrap().clone();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted, "commits must come out in non-decreasing start order");
}

#[test]
fn overlapping_candidates_commit_leftmost_longest_only() {
    // `a+` over "aaa" has candidates (0,0),(0,1),(0,2),(1,1),(1,2),(2,2); only
    // the leftmost-longest (0,2) may ever reach the sink (§1, §4.2).
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("a+", action).unwrap();
    let mut buffer = StrBuffer::new("aaa");
    matcher.exec(&mut buffer);
    assert_eq!(*hits.lock().unwrap(), vec![(0, 2)]);
}

#[test]
fn reattaching_a_known_pattern_does_not_duplicate_registration() {
    let matcher = Matcher::new();
    let (hits_a, action_a) = recorder();
    let (hits_b, action_b) = recorder();
    matcher.add("fox", action_a).unwrap();
    matcher.add("fox", action_b).unwrap();
    assert_eq!(matcher.pattern_count(), 1);
    let mut buffer = StrBuffer::new("the quick fox");
    matcher.exec(&mut buffer);
    assert_eq!(*hits_a.lock().unwrap(), vec![(10, 12)]);
    assert_eq!(*hits_b.lock().unwrap(), vec![(10, 12)]);
}

#[test]
fn invalid_pattern_is_rejected_and_others_still_match() {
    let matcher = Matcher::new();
    let (hits, action) = recorder();
    matcher.add("a+", action).unwrap();
    let err = matcher.add("a(b", Arc::new(|_, _, _| {})).unwrap_err();
    assert!(matches!(err, manyregex::ParseError::Syntax { .. }));
    let mut buffer = StrBuffer::new("aaa");
    matcher.exec(&mut buffer);
    assert_eq!(*hits.lock().unwrap(), vec![(0, 2)]);
}

#[test]
fn unsupported_constructs_are_rejected_with_parse_error() {
    let matcher = Matcher::new();
    let err = matcher.add("^abc$", Arc::new(|_, _, _| {})).unwrap_err();
    assert!(matches!(err, manyregex::ParseError::Unsupported { .. }));
}

#[test]
fn configuration_error_surfaces_at_construction() {
    let err = Matcher::from_selections("quantum", "aho", 100).unwrap_err();
    assert!(matches!(err, manyregex::ConfigurationError::UnknownEngine(_)));
}
