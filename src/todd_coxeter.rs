//! Todd-Coxeter coset enumeration (HLT with lookahead).
//!
//! Enumerates the classes of the two-sided congruence generated by the
//! relations on the free monoid: coset 0 is the class of the empty word,
//! and every relation is pushed at every coset, which closes the right
//! congruence under left multiplication. The coset table is a flat
//! row-major array; merged cosets are tracked by a union-find in which the
//! smaller id always survives, and table entries are canonicalised on read.
//!
//! One unit of progress is one item at one coset: either the closure of a
//! single generator edge or the trace of one relation (with its consequent
//! coincidence processing). A full no-defining verification pass gates the
//! finished state, after which the table is compacted.

use crate::cayley::{CayleySeed, UNDEFINED};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::froidure_pin::FroidurePin;
use crate::presentation::Presentation;
use crate::report;
use crate::runner::{Runner, StepOutcome, Stopper};
use crate::word::{Letter, Word};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Internal coset id.
pub type Coset = u32;

/// How many defined-to-live cosets to tolerate before a lookahead pass.
const LOOKAHEAD_RATIO: usize = 3;

/// Union-find over coset ids; the canonical representative of a class is
/// its smallest member.
#[derive(Debug, Clone, Default)]
struct UnionFind {
    parent: Vec<Coset>,
}

impl UnionFind {
    fn push(&mut self) -> Coset {
        let id = self.parent.len() as Coset;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: Coset) -> Coset {
        while self.parent[x as usize] != x {
            // Path halving keeps lookups near-constant.
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Make `winner` the representative of `loser`'s class. Both must be
    /// roots and `winner < loser`.
    fn merge_into(&mut self, winner: Coset, loser: Coset) {
        debug_assert!(winner < loser);
        self.parent[loser as usize] = winner;
    }

    fn len(&self) -> usize {
        self.parent.len()
    }
}

/// How to use a Froidure-Pin instance when constructing the enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FroidurePinPolicy {
    /// Seed the coset table with the right Cayley graph.
    UseCayleyGraph,
    /// Use the emitted rewrite rules as the defining relations.
    UseRelations,
}

/// Enumeration phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Define generator closures and push relations, coset by coset.
    Scan,
    /// No-defining re-trace of every relation at every live coset.
    Verify,
    Done,
}

pub struct ToddCoxeter {
    nr_gens: usize,
    relations: Vec<(Word, Word)>,
    /// Row-major coset table, stride `nr_gens`. Entries may be stale ids;
    /// reads canonicalise through the union-find.
    table: Vec<Coset>,
    uf: UnionFind,
    coincidences: VecDeque<(Coset, Coset)>,
    nr_alive: usize,
    /// Total cosets ever defined; survives compaction.
    nr_defined: usize,
    max_cosets: usize,
    phase: Phase,
    /// Scan/verify cursor: coset and item index (< nr_gens: generator
    /// closure; >= nr_gens: relation `item - nr_gens`).
    current: Coset,
    item: usize,
    /// Whether the running verify pass found a coincidence.
    verify_dirty: bool,
    last_lookahead: usize,
    started: bool,
    stopper: Stopper,
    /// Shortlex-minimal representative per coset, built on demand after
    /// completion.
    class_words: Option<Vec<Word>>,
}

impl ToddCoxeter {
    /// Enumeration of the congruence of a presentation.
    pub fn from_presentation(p: &Presentation) -> Self {
        let relations = p.relations().to_vec();
        Self::with_relations(p.alphabet_size(), relations)
    }

    /// Enumeration over `nr_gens` generators with an explicit relation
    /// list (used with [`FroidurePinPolicy::UseRelations`]).
    pub fn with_relations(nr_gens: usize, relations: Vec<(Word, Word)>) -> Self {
        let mut tc = Self {
            nr_gens,
            relations,
            table: Vec::new(),
            uf: UnionFind::default(),
            coincidences: VecDeque::new(),
            nr_alive: 0,
            nr_defined: 0,
            max_cosets: crate::fpsemigroup::Settings::default().max_cosets,
            phase: Phase::Scan,
            current: 0,
            item: 0,
            verify_dirty: false,
            last_lookahead: 0,
            started: false,
            stopper: Stopper::new(),
            class_words: None,
        };
        // Coset 0: the class of the empty word.
        tc.table.extend(std::iter::repeat(UNDEFINED).take(nr_gens));
        tc.uf.push();
        tc.nr_alive = 1;
        tc.nr_defined = 1;
        tc
    }

    /// Enumeration seeded with a right Cayley graph: coset `i + 1` is
    /// element `i`, and every generator edge is already defined
    /// ([`FroidurePinPolicy::UseCayleyGraph`]).
    pub fn from_cayley_seed(seed: &CayleySeed, relations: Vec<(Word, Word)>) -> Self {
        let nr_gens = seed.right.nr_gens();
        let nr_elements = seed.right.nr_nodes();
        let mut tc = Self::with_relations(nr_gens, relations);
        for g in 0..nr_gens {
            tc.table[g] = seed.gen_elements[g] + 1;
        }
        for id in 0..nr_elements as Coset {
            tc.uf.push();
            for g in 0..nr_gens as u32 {
                tc.table.push(seed.right.get(id, g) + 1);
            }
        }
        tc.nr_alive = 1 + nr_elements;
        tc.nr_defined = tc.nr_alive;
        tc
    }

    /// Enumeration derived from a Froidure-Pin instance, either seeded with
    /// its right Cayley graph or presented by its rewrite rules. Completes
    /// the enumeration of `fp` first.
    pub fn from_froidure_pin<T: Element>(
        fp: &mut FroidurePin<T>,
        policy: FroidurePinPolicy,
    ) -> Result<Self> {
        match policy {
            FroidurePinPolicy::UseCayleyGraph => {
                let seed = fp.cayley_seed()?;
                Ok(Self::from_cayley_seed(&seed, fp.rules().to_vec()))
            }
            FroidurePinPolicy::UseRelations => {
                fp.nr_rules()?;
                Ok(Self::with_relations(fp.nr_gens(), fp.rules().to_vec()))
            }
        }
    }

    /// Cap on the total number of cosets ever defined.
    pub fn set_max_cosets(&mut self, max_cosets: usize) {
        self.max_cosets = max_cosets;
    }

    pub fn nr_gens(&self) -> usize {
        self.nr_gens
    }

    /// Total cosets defined so far (the high-water mark).
    pub fn nr_cosets_defined(&self) -> usize {
        self.nr_defined
    }

    /// Live cosets right now, including the empty-word coset.
    pub fn current_nr_cosets(&self) -> usize {
        self.nr_alive
    }

    #[inline]
    fn raw(&self, c: Coset, g: Letter) -> Coset {
        self.table[c as usize * self.nr_gens + g as usize]
    }

    #[inline]
    fn set_edge(&mut self, c: Coset, g: Letter, target: Coset) {
        self.table[c as usize * self.nr_gens + g as usize] = target;
    }

    /// The canonicalised target of `(c, g)`, if defined.
    fn entry(&mut self, c: Coset, g: Letter) -> Option<Coset> {
        let raw = self.raw(c, g);
        if raw == UNDEFINED {
            None
        } else {
            Some(self.uf.find(raw))
        }
    }

    fn new_coset(&mut self) -> Result<Coset> {
        if self.uf.len() >= self.max_cosets {
            return Err(Error::ResourceExhausted(format!(
                "max_cosets ({}) reached",
                self.max_cosets
            )));
        }
        let id = self.uf.push();
        self.table
            .extend(std::iter::repeat(UNDEFINED).take(self.nr_gens));
        self.nr_alive += 1;
        self.nr_defined += 1;
        Ok(id)
    }

    /// Walk `w` from `c`, defining missing edges when `define` is set.
    /// Returns `None` only in no-defining mode when an edge is missing.
    fn trace(&mut self, c: Coset, w: &[Letter], define: bool) -> Result<Option<Coset>> {
        let mut cur = self.uf.find(c);
        for &a in w {
            cur = match self.entry(cur, a) {
                Some(next) => next,
                None if define => {
                    let next = self.new_coset()?;
                    self.set_edge(cur, a, next);
                    next
                }
                None => return Ok(None),
            };
        }
        Ok(Some(cur))
    }

    /// Trace both sides of a relation from `c` and equate the endpoints.
    /// Returns true if a coincidence was found.
    fn push_relation(&mut self, c: Coset, rel: usize, define: bool) -> Result<bool> {
        let (u, v) = self.relations[rel].clone();
        let x = self.trace(c, &u, define)?;
        let y = self.trace(c, &v, define)?;
        if let (Some(x), Some(y)) = (x, y) {
            let (x, y) = (self.uf.find(x), self.uf.find(y));
            if x != y {
                self.coincidences.push_back((x, y));
                self.process_coincidences();
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drain the coincidence queue: merge classes (smaller id survives) and
    /// fold the dead coset's outgoing edges onto the survivor, queueing the
    /// clashes that produces.
    fn process_coincidences(&mut self) {
        while let Some((a, b)) = self.coincidences.pop_front() {
            let a = self.uf.find(a);
            let b = self.uf.find(b);
            if a == b {
                continue;
            }
            let (winner, loser) = if a < b { (a, b) } else { (b, a) };
            self.uf.merge_into(winner, loser);
            self.nr_alive -= 1;
            for g in 0..self.nr_gens as Letter {
                let from_loser = self.raw(loser, g);
                if from_loser == UNDEFINED {
                    continue;
                }
                let on_winner = self.raw(winner, g);
                if on_winner == UNDEFINED {
                    self.set_edge(winner, g, from_loser);
                } else {
                    self.coincidences.push_back((on_winner, from_loser));
                }
            }
        }
    }

    /// One pass over all live cosets applying all relations without
    /// defining; collapses dormant coincidences.
    fn lookahead(&mut self) -> Result<()> {
        if report::enabled() {
            info!(
                defined = self.uf.len(),
                alive = self.nr_alive,
                "todd-coxeter lookahead"
            );
        }
        for c in 0..self.uf.len() as Coset {
            if self.uf.find(c) != c {
                continue;
            }
            for rel in 0..self.relations.len() {
                self.push_relation(c, rel, false)?;
            }
        }
        self.last_lookahead = self.uf.len();
        Ok(())
    }

    /// Advance the cursor to the next live coset, resetting the item index.
    fn advance_coset(&mut self) {
        loop {
            self.current += 1;
            self.item = 0;
            if self.current as usize >= self.uf.len() {
                return;
            }
            if self.uf.find(self.current) == self.current {
                return;
            }
        }
    }

    fn scan_step(&mut self) -> Result<StepOutcome> {
        if self.current as usize >= self.uf.len() {
            self.phase = Phase::Verify;
            self.current = 0;
            self.item = 0;
            self.verify_dirty = false;
            return Ok(StepOutcome::Progressed);
        }
        if self.uf.find(self.current) != self.current {
            self.advance_coset();
            return Ok(StepOutcome::Progressed);
        }
        let c = self.current;
        if self.item < self.nr_gens {
            let g = self.item as Letter;
            if self.entry(c, g).is_none() {
                let next = self.new_coset()?;
                self.set_edge(c, g, next);
            }
            self.item += 1;
        } else if self.item < self.nr_gens + self.relations.len() {
            let rel = self.item - self.nr_gens;
            self.push_relation(c, rel, true)?;
            self.item += 1;
        } else {
            // Coset complete; consider a lookahead before moving on.
            if self.uf.len() > LOOKAHEAD_RATIO * self.nr_alive
                && self.uf.len() > self.last_lookahead + self.nr_alive
            {
                self.lookahead()?;
            }
            self.advance_coset();
            if report::enabled() && self.current % 4096 == 0 {
                info!(
                    coset = self.current,
                    defined = self.uf.len(),
                    alive = self.nr_alive,
                    "todd-coxeter scan"
                );
            }
        }
        Ok(StepOutcome::Progressed)
    }

    fn verify_step(&mut self) -> Result<StepOutcome> {
        if self.current as usize >= self.uf.len() {
            if self.verify_dirty {
                // A collapse happened; re-verify from the top.
                self.current = 0;
                self.item = 0;
                self.verify_dirty = false;
                return Ok(StepOutcome::Progressed);
            }
            self.compact();
            self.phase = Phase::Done;
            if report::enabled() {
                info!(classes = self.nr_alive - 1, "todd-coxeter finished");
            }
            return Ok(StepOutcome::Finished);
        }
        if self.uf.find(self.current) != self.current || self.item >= self.relations.len() {
            self.current += 1;
            self.item = 0;
            return Ok(StepOutcome::Progressed);
        }
        let rel = self.item;
        let c = self.current;
        if self.push_relation(c, rel, false)? {
            self.verify_dirty = true;
            debug!(coset = c, rel, "verification pass found a coincidence");
        }
        self.item += 1;
        Ok(StepOutcome::Progressed)
    }

    /// Renumber live cosets contiguously and canonicalise every entry; the
    /// union-find becomes the identity.
    fn compact(&mut self) {
        let total = self.uf.len();
        let mut remap: Vec<Coset> = vec![UNDEFINED; total];
        let mut next: Coset = 0;
        for c in 0..total as Coset {
            if self.uf.find(c) == c {
                remap[c as usize] = next;
                next += 1;
            }
        }
        let mut table = vec![UNDEFINED; next as usize * self.nr_gens];
        for c in 0..total as Coset {
            if self.uf.find(c) != c {
                continue;
            }
            let new_c = remap[c as usize] as usize;
            for g in 0..self.nr_gens {
                let raw = self.table[c as usize * self.nr_gens + g];
                if raw != UNDEFINED {
                    table[new_c * self.nr_gens + g] = remap[self.uf.find(raw) as usize];
                }
            }
        }
        self.table = table;
        self.uf = UnionFind::default();
        for _ in 0..next {
            self.uf.push();
        }
        self.nr_alive = next as usize;
    }

    /// The number of classes of the presented semigroup. Runs the
    /// enumeration to completion; unbounded if the quotient is infinite.
    pub fn nr_classes(&mut self) -> Result<usize> {
        match self.run()? {
            StepOutcome::Finished => Ok(self.nr_alive - 1),
            _ => Err(Error::Interrupted),
        }
    }

    /// The class of a word. Runs the enumeration to completion first.
    pub fn word_to_class(&mut self, w: &[Letter]) -> Result<u32> {
        for &a in w {
            if a as usize >= self.nr_gens {
                return Err(Error::Presentation(format!(
                    "letter {} out of range for {} generators",
                    a, self.nr_gens
                )));
            }
        }
        if w.is_empty() {
            return Err(Error::Presentation(
                "the empty word does not name a class".into(),
            ));
        }
        if !self.finished() {
            match self.run()? {
                StepOutcome::Finished => {}
                _ => return Err(Error::Interrupted),
            }
        }
        match self.trace(0, w, false)? {
            // Compacted: coset 0 is the empty word, classes shift down one.
            Some(c) => Ok(c - 1),
            None => Err(Error::Unfinished),
        }
    }

    /// The shortlex-least word in a class.
    pub fn class_to_word(&mut self, class: u32) -> Result<Word> {
        if !self.finished() {
            match self.run()? {
                StepOutcome::Finished => {}
                _ => return Err(Error::Interrupted),
            }
        }
        if class as usize + 1 >= self.nr_alive {
            return Err(Error::Presentation(format!(
                "class {} out of range ({} classes)",
                class,
                self.nr_alive - 1
            )));
        }
        if self.class_words.is_none() {
            self.build_class_words();
        }
        match self.class_words {
            Some(ref words) => Ok(words[class as usize + 1].clone()),
            None => Err(Error::Unfinished),
        }
    }

    /// Breadth-first walk of the compacted table from coset 0 in shortlex
    /// order: the first word reaching a coset is its least representative.
    fn build_class_words(&mut self) {
        let n = self.nr_alive;
        let mut words: Vec<Option<Word>> = vec![None; n];
        words[0] = Some(Word::new());
        let mut queue: VecDeque<Coset> = VecDeque::new();
        queue.push_back(0);
        while let Some(c) = queue.pop_front() {
            for g in 0..self.nr_gens as Letter {
                let t = self.raw(c, g);
                if t == UNDEFINED {
                    continue;
                }
                if words[t as usize].is_none() {
                    let mut w = match words[c as usize] {
                        Some(ref w) => w.clone(),
                        None => continue,
                    };
                    w.push(g);
                    words[t as usize] = Some(w);
                    queue.push_back(t);
                }
            }
        }
        self.class_words = Some(
            words
                .into_iter()
                .map(|w| w.unwrap_or_default())
                .collect(),
        );
    }

    /// Shortlex-least representatives of all classes, in class order.
    pub fn normal_forms(&mut self) -> Result<Vec<Word>> {
        let n = self.nr_classes()?;
        (0..n as u32).map(|c| self.class_to_word(c)).collect()
    }
}

impl Runner for ToddCoxeter {
    fn step(&mut self) -> Result<StepOutcome> {
        self.started = true;
        match self.phase {
            Phase::Scan => self.scan_step(),
            Phase::Verify => self.verify_step(),
            Phase::Done => Ok(StepOutcome::Finished),
        }
    }

    fn finished(&self) -> bool {
        self.phase == Phase::Done
    }

    fn started(&self) -> bool {
        self.started
    }

    fn stopper(&self) -> &Stopper {
        &self.stopper
    }
}

#[cfg(test)]
#[path = "tests/todd_coxeter.rs"]
mod tests;
