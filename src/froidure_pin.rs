//! Froidure-Pin enumeration.
//!
//! Given a finite generating list of elements with black-box equality and
//! multiplication, enumerate every element of the generated semigroup in
//! shortlex order of their minimal factorisations, building the right
//! Cayley graph as the frontier advances and emitting the confluent rule
//! set of the enumeration. The left Cayley graph is derived in a second
//! pass from the prefix decomposition, without further products.
//!
//! One unit of progress is a single generator multiplication; the engine is
//! resumable between any two units.

use crate::cayley::{CayleyGraph, CayleySeed, UNDEFINED};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::report;
use crate::runner::{Runner, StepOutcome, Stopper};
use crate::word::{Letter, Word};
use hashbrown::HashMap;
use tracing::info;

/// Internal element id; ids grow monotonically in shortlex order of the
/// minimal factorisations.
pub type ElementId = u32;

pub struct FroidurePin<T: Element> {
    gens: Vec<T>,
    /// Letter -> element id (duplicate generator letters share an id).
    letter_to_pos: Vec<ElementId>,
    elements: Vec<T>,
    index: HashMap<T, ElementId>,
    /// Per element: last letter of the minimal factorisation.
    final_letter: Vec<Letter>,
    /// Per element: first letter of the minimal factorisation.
    first_letter: Vec<Letter>,
    /// Per element: id of the factorisation minus its last letter
    /// (`UNDEFINED` marks the identity of the free monoid, i.e. length 1).
    prefix: Vec<ElementId>,
    /// Per element: id of the factorisation minus its first letter.
    suffix: Vec<ElementId>,
    length: Vec<u32>,
    right: CayleyGraph,
    left: Option<CayleyGraph>,
    /// Per (element, generator): whether the product was a new element.
    reduced: Vec<bool>,
    rules: Vec<(Word, Word)>,
    /// Frontier: next element to expand and next generator to apply.
    pos: ElementId,
    gen_i: u32,
    stopper: Stopper,
}

impl<T: Element> FroidurePin<T> {
    /// Start an enumeration from a generating list. The list may contain
    /// repeats; a repeated generator letter is recorded as a rule.
    pub fn new(gens: Vec<T>) -> Self {
        let nr_gens = gens.len();
        let mut fp = Self {
            gens,
            letter_to_pos: Vec::with_capacity(nr_gens),
            elements: Vec::new(),
            index: HashMap::new(),
            final_letter: Vec::new(),
            first_letter: Vec::new(),
            prefix: Vec::new(),
            suffix: Vec::new(),
            length: Vec::new(),
            right: CayleyGraph::new(0, nr_gens),
            left: None,
            reduced: Vec::new(),
            rules: Vec::new(),
            pos: 0,
            gen_i: 0,
            stopper: Stopper::new(),
        };
        for i in 0..nr_gens {
            let g = fp.gens[i].clone();
            match fp.index.get(&g) {
                Some(&id) => {
                    fp.letter_to_pos.push(id);
                    let mut lhs = Word::new();
                    lhs.push(i as Letter);
                    let mut rhs = Word::new();
                    rhs.push(fp.first_letter[id as usize]);
                    fp.rules.push((lhs, rhs));
                }
                None => {
                    let id = fp.register(g, i as Letter, i as Letter, UNDEFINED, UNDEFINED, 1);
                    fp.letter_to_pos.push(id);
                }
            }
        }
        fp
    }

    fn register(
        &mut self,
        element: T,
        first: Letter,
        last: Letter,
        prefix: ElementId,
        suffix: ElementId,
        length: u32,
    ) -> ElementId {
        let id = self.elements.len() as ElementId;
        self.index.insert(element.clone(), id);
        self.elements.push(element);
        self.first_letter.push(first);
        self.final_letter.push(last);
        self.prefix.push(prefix);
        self.suffix.push(suffix);
        self.length.push(length);
        self.right.push_row();
        self.reduced
            .extend(std::iter::repeat(false).take(self.nr_gens()));
        id
    }

    pub fn nr_gens(&self) -> usize {
        self.gens.len()
    }

    pub fn generator(&self, i: usize) -> &T {
        &self.gens[i]
    }

    /// True once the frontier is exhausted: every element has been
    /// multiplied by every generator.
    pub fn is_closed(&self) -> bool {
        (self.pos as usize) == self.elements.len()
    }

    /// Elements found so far.
    pub fn current_size(&self) -> usize {
        self.elements.len()
    }

    /// Rules found so far.
    pub fn current_nr_rules(&self) -> usize {
        self.rules.len()
    }

    /// Whether multiplying `id` by generator `gen` produced a new element,
    /// i.e. whether `factorisation(id)·gen` is itself a minimal
    /// factorisation. False exactly when the product was a re-derivation
    /// (the pairs that emit rewrite rules).
    pub fn is_reduced(&self, id: ElementId, gen: u32) -> bool {
        self.reduced[id as usize * self.nr_gens() + gen as usize]
    }

    /// The minimal factorisation of `id`.
    pub fn factorisation(&self, id: ElementId) -> Result<Word> {
        if id as usize >= self.elements.len() {
            return Err(Error::Element(format!(
                "element id {} out of range (current size {})",
                id,
                self.elements.len()
            )));
        }
        let mut out = Word::with_capacity(self.length[id as usize] as usize);
        let mut cur = id;
        loop {
            out.push(self.final_letter[cur as usize]);
            cur = self.prefix[cur as usize];
            if cur == UNDEFINED {
                break;
            }
        }
        out.reverse();
        Ok(out)
    }

    /// One generator multiplication.
    fn expand_one(&mut self) -> Result<StepOutcome> {
        if self.is_closed() {
            return Ok(StepOutcome::Finished);
        }
        let s = self.pos;
        let g = self.gen_i as usize;
        let product = self.elements[s as usize].multiply(&self.gens[g])?;

        self.gen_i += 1;
        if self.gen_i as usize == self.nr_gens() {
            self.gen_i = 0;
            self.pos += 1;
            if report::enabled() && self.pos % 4096 == 0 {
                info!(
                    expanded = self.pos,
                    size = self.elements.len(),
                    rules = self.rules.len(),
                    "froidure-pin frontier"
                );
            }
        }

        match self.index.get(&product) {
            Some(&id) => {
                self.right.set(s, g as u32, id);
                let mut lhs = self.factorisation(s)?;
                lhs.push(g as Letter);
                let rhs = self.factorisation(id)?;
                self.rules.push((lhs, rhs));
            }
            None => {
                let suffix = if self.length[s as usize] == 1 {
                    self.letter_to_pos[g]
                } else {
                    self.right.get(self.suffix[s as usize], g as u32)
                };
                let id = self.register(
                    product,
                    self.first_letter[s as usize],
                    g as Letter,
                    s,
                    suffix,
                    self.length[s as usize] + 1,
                );
                self.right.set(s, g as u32, id);
                let slot = s as usize * self.nr_gens() + g;
                self.reduced[slot] = true;
            }
        }
        Ok(StepOutcome::Progressed)
    }

    /// Enumerate until at least `limit` elements are known or the
    /// enumeration closes.
    pub fn enumerate(&mut self, limit: usize) -> Result<()> {
        while !self.is_closed() && self.elements.len() < limit {
            self.expand_one()?;
        }
        Ok(())
    }

    fn enumerate_all(&mut self) -> Result<()> {
        while !self.is_closed() {
            self.expand_one()?;
        }
        Ok(())
    }

    /// The size of the generated semigroup. Runs the enumeration to
    /// completion; unbounded if the semigroup is infinite.
    pub fn size(&mut self) -> Result<usize> {
        self.enumerate_all()?;
        Ok(self.elements.len())
    }

    /// Number of rewrite rules of the completed enumeration.
    pub fn nr_rules(&mut self) -> Result<usize> {
        self.enumerate_all()?;
        Ok(self.rules.len())
    }

    /// Rules found so far, in discovery order.
    pub fn rules(&self) -> &[(Word, Word)] {
        &self.rules
    }

    /// Number of idempotents of the completed enumeration.
    pub fn nr_idempotents(&mut self) -> Result<usize> {
        self.enumerate_all()?;
        let mut count = 0;
        for id in 0..self.elements.len() {
            let sq = self.elements[id].multiply(&self.elements[id])?;
            if self.index.get(&sq) == Some(&(id as ElementId)) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// The id of `x`, enumerating until it appears. Unbounded if `x` is not
    /// in the semigroup and the semigroup is infinite.
    pub fn position(&mut self, x: &T) -> Result<Option<ElementId>> {
        loop {
            if let Some(&id) = self.index.get(x) {
                return Ok(Some(id));
            }
            if self.is_closed() {
                return Ok(None);
            }
            self.expand_one()?;
        }
    }

    /// The minimal factorisation of `x`.
    pub fn factorisation_of(&mut self, x: &T) -> Result<Word> {
        match self.position(x)? {
            Some(id) => self.factorisation(id),
            None => Err(Error::Element(
                "element is not in the semigroup generated by the generators".into(),
            )),
        }
    }

    /// Evaluate a word over the generators to an element.
    pub fn word_to_element(&self, w: &[Letter]) -> Result<T> {
        if w.is_empty() {
            return Err(Error::Element(
                "cannot evaluate the empty word without an identity".into(),
            ));
        }
        for &a in w {
            if a as usize >= self.nr_gens() {
                return Err(Error::Element(format!(
                    "letter {} out of range for {} generators",
                    a,
                    self.nr_gens()
                )));
            }
        }
        let mut acc = self.gens[w[0] as usize].clone();
        for &a in &w[1..] {
            acc = acc.multiply(&self.gens[a as usize])?;
        }
        Ok(acc)
    }

    /// The complete right Cayley graph.
    pub fn right_cayley_graph(&mut self) -> Result<&CayleyGraph> {
        self.enumerate_all()?;
        Ok(&self.right)
    }

    /// The complete left Cayley graph, derived from the prefix
    /// decomposition: `g·(p·x_j) = (g·p)·x_j`.
    pub fn left_cayley_graph(&mut self) -> Result<&CayleyGraph> {
        self.enumerate_all()?;
        if self.left.is_none() {
            let n = self.elements.len();
            let nr_gens = self.nr_gens();
            let mut left = CayleyGraph::new(n, nr_gens);
            for id in 0..n as ElementId {
                let j = self.final_letter[id as usize];
                for g in 0..nr_gens as u32 {
                    let target = if self.length[id as usize] == 1 {
                        self.right.get(self.letter_to_pos[g as usize], j)
                    } else {
                        let gp = left.get(self.prefix[id as usize], g);
                        self.right.get(gp, j)
                    };
                    left.set(id, g, target);
                }
            }
            self.left = Some(left);
        }
        match self.left {
            Some(ref left) => Ok(left),
            None => Err(Error::Unfinished),
        }
    }

    /// Publish the Cayley seed consumed by Todd-Coxeter.
    pub fn cayley_seed(&mut self) -> Result<CayleySeed> {
        self.enumerate_all()?;
        Ok(CayleySeed {
            right: self.right.clone(),
            gen_elements: self.letter_to_pos.clone(),
        })
    }
}

impl<T: Element> Runner for FroidurePin<T> {
    fn step(&mut self) -> Result<StepOutcome> {
        self.expand_one()
    }

    fn finished(&self) -> bool {
        self.is_closed()
    }

    fn started(&self) -> bool {
        self.pos > 0 || self.gen_i > 0 || self.is_closed()
    }

    fn stopper(&self) -> &Stopper {
        &self.stopper
    }
}

#[cfg(test)]
#[path = "tests/froidure_pin.rs"]
mod tests;
