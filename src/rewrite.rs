//! String rewriting systems.
//!
//! A rewrite system is a set of oriented rules `lhs -> rhs` with
//! `lhs > rhs` in shortlex. Rules are plain word data: interreduction and
//! completion treat the rule set as a set, never as a pointer graph.
//! Deactivated rules stay in the backing vector so rule indices remain
//! stable for the completion bookkeeping.

use crate::order::{shortlex_compare, shortlex_less};
use crate::word::{word, Letter, Word};
use std::cmp::Ordering;

/// One oriented rule. `active` is cleared by interreduction instead of
/// removing the entry, keeping indices stable.
#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: Word,
    pub rhs: Word,
    pub active: bool,
}

/// Orient a relation by shortlex: the larger side becomes the LHS.
/// Returns `None` for trivial relations.
pub fn orient(u: &[Letter], v: &[Letter]) -> Option<(Word, Word)> {
    match shortlex_compare(u, v) {
        Ordering::Greater => Some((word(u), word(v))),
        Ordering::Less => Some((word(v), word(u))),
        Ordering::Equal => None,
    }
}

/// Rewrite `input` with a suffix-match oracle.
///
/// Letters move from a pending stack onto an output word that is kept
/// irreducible: whenever a rule LHS matches a suffix of the output, the
/// suffix is removed and the RHS is pushed back onto the pending stack so
/// redexes created inside it are found again. `find_suffix` returns the
/// `(lhs_len, rhs)` of a matching rule for the current output, if any.
fn rewrite_with<'a, F>(input: &[Letter], find_suffix: F) -> Word
where
    F: Fn(&[Letter]) -> Option<(usize, &'a [Letter])>,
{
    let mut out = Word::with_capacity(input.len());
    let mut pending: Word = input.iter().rev().copied().collect();
    while let Some(a) = pending.pop() {
        out.push(a);
        if let Some((lhs_len, rhs)) = find_suffix(&out) {
            out.truncate(out.len() - lhs_len);
            for &b in rhs.iter().rev() {
                pending.push(b);
            }
        }
    }
    out
}

/// A mutable rewrite system: the working state of Knuth-Bendix.
#[derive(Debug, Clone, Default)]
pub struct RewriteSystem {
    rules: Vec<Rule>,
    nr_active: usize,
}

impl RewriteSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-oriented rule and return its index.
    pub fn push_oriented(&mut self, lhs: Word, rhs: Word) -> usize {
        debug_assert!(shortlex_less(&rhs, &lhs));
        self.rules.push(Rule {
            lhs,
            rhs,
            active: true,
        });
        self.nr_active += 1;
        self.rules.len() - 1
    }

    pub fn deactivate(&mut self, index: usize) {
        if self.rules[index].active {
            self.rules[index].active = false;
            self.nr_active -= 1;
        }
    }

    pub fn set_rhs(&mut self, index: usize, rhs: Word) {
        self.rules[index].rhs = rhs;
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.rules[index].active
    }

    /// Total rules ever stored, active or not.
    pub fn nr_rules_total(&self) -> usize {
        self.rules.len()
    }

    pub fn nr_active(&self) -> usize {
        self.nr_active
    }

    /// Indices of the active rules, in activation order.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, r)| r.active)
            .map(|(i, _)| i)
    }

    /// The active rules as `(lhs, rhs)` pairs, in activation order.
    pub fn active_rules(&self) -> impl Iterator<Item = (&Word, &Word)> + '_ {
        self.rules
            .iter()
            .filter(|r| r.active)
            .map(|r| (&r.lhs, &r.rhs))
    }

    /// Reduce `input` to a normal form with the active rules.
    pub fn rewrite(&self, input: &[Letter]) -> Word {
        rewrite_with(input, |out| {
            for r in &self.rules {
                if r.active && r.lhs.len() <= out.len() && out.ends_with(&r.lhs) {
                    return Some((r.lhs.len(), r.rhs.as_slice()));
                }
            }
            None
        })
    }

    /// True iff no active rule applies anywhere in `w`.
    pub fn is_irreducible(&self, w: &[Letter]) -> bool {
        self.rules
            .iter()
            .filter(|r| r.active)
            .all(|r| !crate::word::is_factor(w, &r.lhs))
    }

    /// Publish an immutable snapshot of the active rules, ordered by
    /// shortlex of the LHS.
    pub fn snapshot(&self, alphabet_size: usize) -> RewriteSnapshot {
        let mut rules: Vec<(Word, Word)> = self
            .active_rules()
            .map(|(l, r)| (l.clone(), r.clone()))
            .collect();
        rules.sort_by(|a, b| shortlex_compare(&a.0, &b.0).then_with(|| shortlex_compare(&a.1, &b.1)));
        RewriteSnapshot {
            alphabet_size,
            rules,
        }
    }
}

/// An immutable rewrite system: the one-shot artefact Knuth-Bendix
/// publishes for consumption by Froidure-Pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSnapshot {
    alphabet_size: usize,
    rules: Vec<(Word, Word)>,
}

impl RewriteSnapshot {
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    pub fn nr_rules(&self) -> usize {
        self.rules.len()
    }

    /// Rules in shortlex order of their LHS.
    pub fn rules(&self) -> &[(Word, Word)] {
        &self.rules
    }

    /// Reduce `input` to a normal form.
    pub fn rewrite(&self, input: &[Letter]) -> Word {
        rewrite_with(input, |out| {
            for (lhs, rhs) in &self.rules {
                if lhs.len() <= out.len() && out.ends_with(lhs) {
                    return Some((lhs.len(), rhs.as_slice()));
                }
            }
            None
        })
    }
}
