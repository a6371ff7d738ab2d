use super::*;
use crate::order::shortlex_less;
use crate::word::is_factor;

fn kb_with(alphabet: usize, rules: &[(&[Letter], &[Letter])]) -> KnuthBendix {
    let mut kb = KnuthBendix::new(alphabet);
    for &(u, v) in rules {
        kb.add_rule(u, v).expect("rule must be accepted");
    }
    kb
}

/// The oriented-and-reduced invariants of an active rule set.
fn assert_rule_invariants(kb: &KnuthBendix) {
    let rules: Vec<(Word, Word)> = kb.rules().map(|(l, r)| (l.clone(), r.clone())).collect();
    for (i, (lhs, rhs)) in rules.iter().enumerate() {
        assert!(
            shortlex_less(rhs, lhs),
            "rule {:?} -> {:?} must be oriented by shortlex",
            lhs,
            rhs
        );
        assert_eq!(
            kb.rewrite(rhs).as_slice(),
            rhs.as_slice(),
            "right-hand side {:?} must be irreducible",
            rhs
        );
        for (j, (other_lhs, _)) in rules.iter().enumerate() {
            if i != j {
                assert!(
                    !is_factor(lhs, other_lhs),
                    "left-hand side {:?} contains {:?}: rules are not interreduced",
                    lhs,
                    other_lhs
                );
            }
        }
    }
}

#[test]
fn orientation_happens_at_add_time() {
    let kb = kb_with(2, &[(&[0], &[1, 1])]);
    let rules: Vec<_> = kb.rules().collect();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].0.as_slice(), &[1, 1], "larger side becomes the LHS");
    assert_eq!(rules[0].1.as_slice(), &[0]);
}

#[test]
fn trivial_and_duplicate_rules_are_dropped() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0])]);
    kb.add_rule(&[0, 1], &[0, 1]).unwrap();
    kb.add_rule(&[0, 0, 0], &[0]).unwrap();
    assert_eq!(kb.nr_active_rules(), 1);
}

#[test]
fn out_of_range_letter_is_rejected() {
    let mut kb = KnuthBendix::new(2);
    assert!(matches!(
        kb.add_rule(&[0, 2], &[0]),
        Err(Error::Presentation(_))
    ));
}

#[test]
fn add_rule_fails_after_completion_starts() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    kb.run_steps(1).unwrap();
    assert_eq!(kb.add_rule(&[0, 1], &[1]), Err(Error::PresentationFrozen));
}

#[test]
fn completion_of_a_three_rule_system() {
    // <a, b | a^3 = a, a = b^2>: completion adds ba -> ab and stops.
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    assert!(kb.run().is_ok());
    assert!(kb.finished());
    assert!(kb.confluent());
    assert_eq!(kb.nr_active_rules(), 3);
    assert_rule_invariants(&kb);
}

#[test]
fn rewriting_reaches_the_normal_form() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    kb.run().unwrap();
    assert_eq!(kb.rewrite(&[0, 0, 1]).as_slice(), &[0, 0, 1]);
    assert_eq!(kb.rewrite(&[0, 0, 0, 0, 1]).as_slice(), &[0, 0, 1]);
    assert_eq!(kb.rewrite(&[0, 1, 1, 0, 0, 1]).as_slice(), &[0, 0, 1]);
    assert_eq!(kb.rewrite(&[0, 0, 0]).as_slice(), &[0]);
    assert_eq!(kb.rewrite(&[1]).as_slice(), &[1]);
}

#[test]
fn confluence_check_before_completion() {
    // The initial system has an unresolved critical pair from bb|bb.
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    assert!(!kb.confluent());
    kb.run().unwrap();
    assert!(kb.confluent());
}

#[test]
fn confluence_verdict_is_cached_and_invalidated() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0])]);
    assert!(kb.confluent(), "a single rule cannot overlap inconsistently");
    // Still mutable: adding a clashing rule must clear the cache.
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0])]);
    assert!(kb.confluent());
    kb.add_rule(&[0], &[1, 1]).unwrap();
    assert!(!kb.confluent());
}

#[test]
fn by_overlap_length_reaches_the_same_system() {
    let mut fifo = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    fifo.run().unwrap();
    let mut by_len = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    by_len.knuth_bendix_by_overlap_length().unwrap();
    assert!(by_len.confluent());
    let mut lhs_fifo: Vec<Word> = fifo.rules().map(|(l, _)| l.clone()).collect();
    let mut lhs_len: Vec<Word> = by_len.rules().map(|(l, _)| l.clone()).collect();
    lhs_fifo.sort();
    lhs_len.sort();
    assert_eq!(lhs_fifo, lhs_len);
}

#[test]
fn interrupted_completion_resumes_where_it_left_off() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    let mut bounded_runs = 0;
    while !kb.finished() {
        kb.run_steps(1).unwrap();
        bounded_runs += 1;
        assert!(bounded_runs < 1000, "completion must terminate here");
    }
    assert!(kb.confluent());
    assert_eq!(kb.nr_active_rules(), 3);
}

#[test]
fn stopper_interrupts_a_run() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    kb.stopper().stop();
    assert_eq!(kb.run().unwrap(), StepOutcome::Interrupted);
    // State is intact; resuming completes.
    assert_eq!(kb.run().unwrap(), StepOutcome::Finished);
}

#[test]
fn max_rules_cap_is_a_resource_error() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    kb.set_max_rules(2);
    match kb.run() {
        Err(Error::ResourceExhausted(msg)) => assert!(msg.contains("max_rules")),
        other => panic!("expected ResourceExhausted, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn froidure_pin_enumerates_the_normal_forms() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    let fp = kb.froidure_pin().unwrap();
    assert_eq!(fp.size().unwrap(), 5);
    assert_eq!(fp.nr_idempotents().unwrap(), 1);
}

#[test]
fn snapshot_agrees_with_the_live_system() {
    let mut kb = kb_with(2, &[(&[0, 0, 0], &[0]), (&[0], &[1, 1])]);
    kb.run().unwrap();
    let snap = kb.snapshot();
    assert_eq!(snap.nr_rules(), kb.nr_active_rules());
    for w in [&[0u32, 1, 1, 0][..], &[1, 1, 1][..], &[1, 0, 1, 0][..]] {
        assert_eq!(snap.rewrite(w), kb.rewrite(w));
    }
}

#[test]
fn currently_equal_is_sound_before_confluence() {
    let mut kb = kb_with(2, &[(&[0, 0], &[0]), (&[0, 1], &[0]), (&[1, 0], &[0])]);
    // No completion has run, yet these follow from the raw rules.
    assert!(kb.currently_equal(&[0, 1], &[0]));
    assert!(kb.currently_equal(&[1, 0, 1, 0], &[0]));
    assert!(!kb.currently_equal(&[1], &[0]));
    assert!(!kb.started());
}

#[test]
fn presentation_constructor_carries_the_relations() {
    let mut p = crate::presentation::Presentation::new();
    p.set_alphabet(2).unwrap();
    p.add_rule(&[0, 0, 0], &[0]).unwrap();
    p.add_rule(&[0], &[1, 1]).unwrap();
    let mut kb = KnuthBendix::from_presentation(&p).unwrap();
    kb.run().unwrap();
    assert_eq!(kb.nr_active_rules(), 3);
}
