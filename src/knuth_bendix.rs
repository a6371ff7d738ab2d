//! Knuth-Bendix completion over string rewriting systems.
//!
//! The engine keeps an active rule set and a stack of unprocessed
//! equations. Completion repeatedly takes a pending pair of active rules,
//! forms every critical pair from their overlaps, and drains the stack,
//! interreducing the active set as new rules land. When the pending queue
//! empties the system is confluent.
//!
//! One unit of progress is the consideration of one pending rule pair
//! (including the stack drain it triggers); the engine is resumable between
//! units and non-terminating on presentations without a finite complete
//! system, so callers bound it with the run controls.

use crate::element::KbElement;
use crate::error::{Error, Result};
use crate::froidure_pin::FroidurePin;
use crate::presentation::Presentation;
use crate::report;
use crate::rewrite::{orient, RewriteSnapshot, RewriteSystem};
use crate::runner::{Runner, StepOutcome, Stopper};
use crate::word::{concat, is_factor, word, Letter, Word};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Order in which pending rule pairs are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOrder {
    /// FIFO in order of discovery.
    Discovery,
    /// Ascending total length of the two left-hand sides.
    OverlapLength,
}

pub struct KnuthBendix {
    alphabet_size: usize,
    system: RewriteSystem,
    /// Unprocessed equations.
    stack: Vec<(Word, Word)>,
    /// Ordered rule pairs whose overlaps have not been considered.
    pending: VecDeque<(usize, usize)>,
    pair_order: PairOrder,
    max_rules: usize,
    started: bool,
    finished: bool,
    /// Cached verdict of the on-demand confluence check.
    confluence: Option<bool>,
    stopper: Stopper,
    fp: Option<FroidurePin<KbElement>>,
}

impl KnuthBendix {
    /// An empty system over `alphabet_size` letters.
    pub fn new(alphabet_size: usize) -> Self {
        Self {
            alphabet_size,
            system: RewriteSystem::new(),
            stack: Vec::new(),
            pending: VecDeque::new(),
            pair_order: PairOrder::Discovery,
            max_rules: crate::fpsemigroup::Settings::default().max_rules,
            started: false,
            finished: false,
            confluence: None,
            stopper: Stopper::new(),
            fp: None,
        }
    }

    /// A system initialised from the oriented relations of a presentation.
    pub fn from_presentation(p: &Presentation) -> Result<Self> {
        let mut kb = Self::new(p.alphabet_size());
        for (u, v) in p.relations() {
            kb.add_rule(u, v)?;
        }
        Ok(kb)
    }

    /// Cap on the total number of rules ever stored.
    pub fn set_max_rules(&mut self, max_rules: usize) {
        self.max_rules = max_rules;
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Add the relation `u = v`, oriented by shortlex. Fails once
    /// completion has started.
    pub fn add_rule(&mut self, u: &[Letter], v: &[Letter]) -> Result<()> {
        if self.started {
            return Err(Error::PresentationFrozen);
        }
        for &a in u.iter().chain(v.iter()) {
            if a as usize >= self.alphabet_size {
                return Err(Error::Presentation(format!(
                    "letter {} out of range for alphabet of size {}",
                    a, self.alphabet_size
                )));
            }
        }
        self.stack.push((word(u), word(v)));
        self.clear_stack()
    }

    /// Number of active rules.
    pub fn nr_active_rules(&self) -> usize {
        self.system.nr_active()
    }

    /// The active rules in activation order.
    pub fn rules(&self) -> impl Iterator<Item = (&Word, &Word)> + '_ {
        self.system.active_rules()
    }

    /// Reduce `w` with the current active rules. The result is the unique
    /// normal form of `w` once the system is confluent.
    pub fn rewrite(&self, w: &[Letter]) -> Word {
        self.system.rewrite(w)
    }

    /// Sound one-sided equality test: `true` means `u = v` in the presented
    /// congruence; `false` means the current rules cannot identify them.
    pub fn currently_equal(&self, u: &[Letter], v: &[Letter]) -> bool {
        self.system.rewrite(u) == self.system.rewrite(v)
    }

    /// Publish the active rules as an immutable snapshot.
    pub fn snapshot(&self) -> RewriteSnapshot {
        self.system.snapshot(self.alphabet_size)
    }

    /// True iff every critical pair of the active rules resolves. Cached
    /// until the rule set changes.
    pub fn confluent(&mut self) -> bool {
        if self.finished {
            return true;
        }
        if let Some(verdict) = self.confluence {
            return verdict;
        }
        let verdict = self.check_confluence();
        self.confluence = Some(verdict);
        verdict
    }

    fn check_confluence(&self) -> bool {
        if !self.stack.is_empty() {
            return false;
        }
        let indices: Vec<usize> = self.system.active_indices().collect();
        for &i in &indices {
            for &j in &indices {
                let l1 = &self.system.rule(i).lhs;
                let l2 = &self.system.rule(j).lhs;
                for k in 1..l1.len() {
                    if k > l2.len() {
                        break;
                    }
                    if l1[l1.len() - k..] != l2[..k] {
                        continue;
                    }
                    let p = concat(&self.system.rule(i).rhs, &l2[k..]);
                    let q = concat(&l1[..l1.len() - k], &self.system.rule(j).rhs);
                    if self.system.rewrite(&p) != self.system.rewrite(&q) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Run completion considering pending pairs in ascending total overlap
    /// length. Blocks until the system is confluent.
    pub fn knuth_bendix_by_overlap_length(&mut self) -> Result<()> {
        self.pair_order = PairOrder::OverlapLength;
        match self.run()? {
            StepOutcome::Finished => Ok(()),
            _ => Err(Error::Interrupted),
        }
    }

    /// The next pending pair whose rules are both still active.
    fn next_pending_pair(&mut self) -> Option<(usize, usize)> {
        match self.pair_order {
            PairOrder::Discovery => loop {
                let (i, j) = self.pending.pop_front()?;
                if self.system.is_active(i) && self.system.is_active(j) {
                    return Some((i, j));
                }
            },
            PairOrder::OverlapLength => {
                // First pair of minimal |lhs_i| + |lhs_j|; discovery order
                // breaks ties.
                let mut best_idx: Option<usize> = None;
                let mut best_len = usize::MAX;
                let mut idx = 0;
                while idx < self.pending.len() {
                    let (i, j) = self.pending[idx];
                    if !(self.system.is_active(i) && self.system.is_active(j)) {
                        self.pending.remove(idx);
                        continue;
                    }
                    let len = self.system.rule(i).lhs.len() + self.system.rule(j).lhs.len();
                    if len < best_len {
                        best_len = len;
                        best_idx = Some(idx);
                    }
                    idx += 1;
                }
                self.pending.remove(best_idx?)
            }
        }
    }

    /// Form every critical pair of the ordered rule pair `(i, j)`: for each
    /// non-empty proper suffix `s` of `lhs_i` that is a prefix of `lhs_j`,
    /// the word `A·s·C` (`lhs_i = A·s`, `lhs_j = s·C`) rewrites two ways.
    fn overlap(&mut self, i: usize, j: usize) -> Result<()> {
        let l1 = self.system.rule(i).lhs.clone();
        for k in 1..l1.len() {
            if !(self.system.is_active(i) && self.system.is_active(j)) {
                break;
            }
            let l2 = &self.system.rule(j).lhs;
            if k > l2.len() {
                break;
            }
            if l1[l1.len() - k..] != l2[..k] {
                continue;
            }
            let p = concat(&self.system.rule(i).rhs, &l2[k..]);
            let q = concat(&l1[..l1.len() - k], &self.system.rule(j).rhs);
            self.stack.push((p, q));
            self.clear_stack()?;
        }
        Ok(())
    }

    /// Drain the equation stack: reduce both sides, orient survivors into
    /// new rules, and interreduce the active set against each new rule.
    fn clear_stack(&mut self) -> Result<()> {
        while let Some((u, v)) = self.stack.pop() {
            let u = self.system.rewrite(&u);
            let v = self.system.rewrite(&v);
            let (lhs, rhs) = match orient(&u, &v) {
                Some(oriented) => oriented,
                None => continue,
            };
            if self.system.nr_rules_total() + 1 > self.max_rules {
                return Err(Error::ResourceExhausted(format!(
                    "max_rules ({}) reached",
                    self.max_rules
                )));
            }
            let new = self.system.push_oriented(lhs, rhs);
            self.confluence = None;
            debug!(
                rule = new,
                active = self.system.nr_active(),
                "knuth-bendix rule added"
            );

            let others: Vec<usize> = self
                .system
                .active_indices()
                .filter(|&x| x != new)
                .collect();
            self.pending.push_back((new, new));
            for &x in &others {
                self.pending.push_back((new, x));
                self.pending.push_back((x, new));
            }

            let new_lhs = self.system.rule(new).lhs.clone();
            for &x in &others {
                if !self.system.is_active(x) {
                    continue;
                }
                if is_factor(&self.system.rule(x).lhs, &new_lhs) {
                    let requeued = (
                        self.system.rule(x).lhs.clone(),
                        self.system.rule(x).rhs.clone(),
                    );
                    self.system.deactivate(x);
                    self.stack.push(requeued);
                } else if is_factor(&self.system.rule(x).rhs, &new_lhs) {
                    let reduced = self.system.rewrite(&self.system.rule(x).rhs);
                    self.system.set_rhs(x, reduced);
                }
            }
        }
        Ok(())
    }

    /// Once completion has finished, the semigroup of normal forms as a
    /// Froidure-Pin instance: one generator per letter, equality by
    /// `rewrite`. Runs completion to confluence first if necessary.
    pub fn froidure_pin(&mut self) -> Result<&mut FroidurePin<KbElement>> {
        if self.fp.is_none() {
            if !self.finished {
                match self.run()? {
                    StepOutcome::Finished => {}
                    _ => return Err(Error::Interrupted),
                }
            }
            let snapshot = Arc::new(self.snapshot());
            let gens: Vec<KbElement> = (0..self.alphabet_size as Letter)
                .map(|a| KbElement::new(Arc::clone(&snapshot), &[a]))
                .collect();
            self.fp = Some(FroidurePin::new(gens));
        }
        match self.fp {
            Some(ref mut fp) => Ok(fp),
            None => Err(Error::Unfinished),
        }
    }
}

impl Runner for KnuthBendix {
    fn step(&mut self) -> Result<StepOutcome> {
        self.started = true;
        if self.finished {
            return Ok(StepOutcome::Finished);
        }
        match self.next_pending_pair() {
            None => {
                self.finished = true;
                self.confluence = Some(true);
                if report::enabled() {
                    info!(
                        active_rules = self.system.nr_active(),
                        "knuth-bendix completion finished"
                    );
                }
                Ok(StepOutcome::Finished)
            }
            Some((i, j)) => {
                self.overlap(i, j)?;
                Ok(StepOutcome::Progressed)
            }
        }
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn started(&self) -> bool {
        self.started
    }

    fn stopper(&self) -> &Stopper {
        &self.stopper
    }
}

#[cfg(test)]
#[path = "tests/knuth_bendix.rs"]
mod tests;
