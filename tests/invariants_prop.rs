//! Property tests for the engine invariants under random presentations.
//!
//! Random presentations are frequently infinite, so every engine run here
//! is step-bounded; the invariants under test are exactly the ones that
//! must hold at any suspension point (or after a finished run, when one
//! happens to finish).

use fpsemi::knuth_bendix::KnuthBendix;
use fpsemi::order::{shortlex_compare, shortlex_less};
use fpsemi::presentation::Presentation;
use fpsemi::todd_coxeter::ToddCoxeter;
use fpsemi::word::{is_factor, Word};
use fpsemi::{FpSemigroup, Runner};
use proptest::prelude::*;
use std::cmp::Ordering;

const MAX_LETTERS: u32 = 3;

fn word_strategy() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0..MAX_LETTERS, 1..6)
}

fn presentation_strategy() -> impl Strategy<Value = Vec<(Vec<u32>, Vec<u32>)>> {
    prop::collection::vec((word_strategy(), word_strategy()), 1..5)
}

fn build_presentation(relations: &[(Vec<u32>, Vec<u32>)]) -> Presentation {
    let mut p = Presentation::new();
    p.set_alphabet(MAX_LETTERS as usize).unwrap();
    for (u, v) in relations {
        p.add_rule(u, v).unwrap();
    }
    p
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    #[test]
    fn knuth_bendix_rules_stay_oriented_and_reduced(relations in presentation_strategy()) {
        let p = build_presentation(&relations);
        let mut kb = KnuthBendix::from_presentation(&p).unwrap();
        let _ = kb.run_steps(500);
        let rules: Vec<(Word, Word)> = kb.rules().map(|(l, r)| (l.clone(), r.clone())).collect();
        for (i, (lhs, rhs)) in rules.iter().enumerate() {
            prop_assert!(shortlex_less(rhs, lhs), "rule {:?} -> {:?} not oriented", lhs, rhs);
            let rewritten_rhs = kb.rewrite(rhs);
            prop_assert_eq!(
                rewritten_rhs.as_slice(),
                rhs.as_slice(),
                "right-hand side not irreducible"
            );
            for (j, (other, _)) in rules.iter().enumerate() {
                if i != j {
                    prop_assert!(
                        !is_factor(lhs, other),
                        "active left-hand sides must be interreduced"
                    );
                }
            }
        }
    }

    #[test]
    fn rewriting_is_sound_for_the_congruence(
        relations in presentation_strategy(),
        u in word_strategy(),
    ) {
        // rewrite(u) is congruent to u, so a second rewrite fixes it.
        let p = build_presentation(&relations);
        let mut kb = KnuthBendix::from_presentation(&p).unwrap();
        let _ = kb.run_steps(300);
        let nf = kb.rewrite(&u);
        let rewritten_nf = kb.rewrite(&nf);
        prop_assert_eq!(rewritten_nf.as_slice(), nf.as_slice());
    }

    #[test]
    fn todd_coxeter_classes_round_trip(relations in presentation_strategy()) {
        let p = build_presentation(&relations);
        let mut tc = ToddCoxeter::from_presentation(&p);
        tc.set_max_cosets(20_000);
        let finished = matches!(tc.run_steps(20_000), Ok(fpsemi::StepOutcome::Finished));
        if finished {
            let n = tc.nr_classes().unwrap();
            prop_assert!(n >= 1);
            for class in 0..n as u32 {
                let w = tc.class_to_word(class).unwrap();
                prop_assert!(!w.is_empty());
                prop_assert_eq!(tc.word_to_class(&w).unwrap(), class);
            }
        }
    }

    #[test]
    fn engines_agree_on_finite_quotients(relations in presentation_strategy()) {
        let p = build_presentation(&relations);
        let mut kb = KnuthBendix::from_presentation(&p).unwrap();
        let mut tc = ToddCoxeter::from_presentation(&p);
        tc.set_max_cosets(20_000);
        let kb_done = matches!(kb.run_steps(400), Ok(fpsemi::StepOutcome::Finished));
        let tc_done = matches!(tc.run_steps(20_000), Ok(fpsemi::StepOutcome::Finished));
        if kb_done && tc_done {
            let fp = kb.froidure_pin().unwrap();
            fp.enumerate(25_000).unwrap();
            if fp.is_closed() {
                prop_assert_eq!(fp.current_size(), tc.nr_classes().unwrap());
            }
        }
    }

    #[test]
    fn equality_matches_normal_forms_in_a_fixed_finite_semigroup(
        u in prop::collection::vec(0..2u32, 1..7),
        v in prop::collection::vec(0..2u32, 1..7),
    ) {
        let mut s = FpSemigroup::new();
        s.set_alphabet(2).unwrap();
        s.add_rule(&[0, 0, 0], &[0]).unwrap();
        s.add_rule(&[0], &[1, 1]).unwrap();
        let equal = s.equal_to(&u, &v).unwrap();
        let nf_u = s.normal_form(&u).unwrap();
        let nf_v = s.normal_form(&v).unwrap();
        prop_assert_eq!(equal, nf_u == nf_v);
        // Normal forms never exceed their input in shortlex.
        prop_assert!(shortlex_compare(&nf_u, &u) != Ordering::Greater);
    }
}
