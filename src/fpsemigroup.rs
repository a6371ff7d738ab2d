//! The finitely-presented semigroup facade.
//!
//! Owns the presentation, lazily creates the engines, and races them in
//! cooperative time slices: Todd-Coxeter enumerates cosets while
//! Knuth-Bendix completes its rewrite system (and, once confluent,
//! enumerates normal forms through Froidure-Pin). Whichever engine finishes
//! first supplies the verdict, which is cached and shared with the others.
//!
//! The presentation freezes when the first engine is created; mutation
//! afterwards fails with `PresentationFrozen`.

use crate::cayley::CayleySeed;
use crate::element::{Element, KbElement};
use crate::error::{Error, Result};
use crate::froidure_pin::FroidurePin;
use crate::knuth_bendix::KnuthBendix;
use crate::presentation::{Presentation, Relation};
use crate::report;
use crate::runner::{RunControl, Runner, StepOutcome};
use crate::todd_coxeter::ToddCoxeter;
use crate::word::{is_power_of, Letter, Word};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The size reported for a quotient known to be infinite.
pub const POSITIVE_INFINITY: usize = usize::MAX;

/// Facade configuration. The caps are snapshotted into an engine when it is
/// created; `slice` and `report` take effect immediately.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cap on Knuth-Bendix rules ever stored.
    pub max_rules: usize,
    /// Cap on Todd-Coxeter cosets ever defined.
    pub max_cosets: usize,
    /// Units of progress per engine per interleaving round.
    pub slice: u64,
    /// Emit progress lines regardless of the global report flag.
    pub report: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_rules: 1 << 24,
            max_cosets: 1 << 24,
            slice: 256,
            report: false,
        }
    }
}

/// Which engine produced the cached verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    KnuthBendix,
    ToddCoxeter,
}

/// What a race is trying to establish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Goal {
    /// A decided word problem: a confluent system or a complete coset table.
    WordProblem,
    /// A full element count: a complete coset table or a closed enumeration.
    Size,
}

#[derive(Default)]
pub struct FpSemigroup {
    presentation: Presentation,
    settings: Settings,
    kb: Option<KnuthBendix>,
    tc: Option<ToddCoxeter>,
    /// Froidure-Pin over Knuth-Bendix normal forms, created once the system
    /// is confluent; the KB-to-FP handoff.
    kb_fp: Option<FroidurePin<KbElement>>,
    /// Right Cayley graph of a concrete semigroup this facade was built
    /// from; seeds Todd-Coxeter (the FP-to-TC handoff).
    cayley_seed: Option<CayleySeed>,
    winner: Option<EngineKind>,
    size: Option<usize>,
    kb_dead: Option<Error>,
    tc_dead: Option<Error>,
}

impl FpSemigroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a facade over a concrete semigroup: the alphabet is one letter
    /// per generator, the relations are the enumeration's rewrite rules,
    /// and the right Cayley graph is kept to seed Todd-Coxeter. Rules may
    /// be added before the first query to present a quotient.
    pub fn from_froidure_pin<T: Element>(fp: &mut FroidurePin<T>) -> Result<Self> {
        fp.size()?;
        let mut s = Self::new();
        s.presentation.set_alphabet(fp.nr_gens())?;
        for (u, v) in fp.rules().to_vec() {
            s.presentation.add_rule(&u, &v)?;
        }
        s.cayley_seed = Some(fp.cayley_seed()?);
        Ok(s)
    }

    // ---- presentation building -------------------------------------------

    pub fn set_alphabet(&mut self, size: usize) -> Result<()> {
        self.presentation.set_alphabet(size)
    }

    pub fn set_alphabet_chars(&mut self, charset: &str) -> Result<()> {
        self.presentation.set_alphabet_chars(charset)
    }

    pub fn set_identity(&mut self, e: Letter) -> Result<()> {
        self.size = None;
        self.presentation.set_identity(e)
    }

    pub fn set_identity_char(&mut self, c: char) -> Result<()> {
        self.size = None;
        self.presentation.set_identity_char(c)
    }

    pub fn add_rule(&mut self, u: &[Letter], v: &[Letter]) -> Result<()> {
        self.size = None;
        self.presentation.add_rule(u, v)
    }

    pub fn add_rule_str(&mut self, u: &str, v: &str) -> Result<()> {
        self.size = None;
        self.presentation.add_rule_str(u, v)
    }

    pub fn alphabet_size(&self) -> usize {
        self.presentation.alphabet_size()
    }

    pub fn identity(&self) -> Option<Letter> {
        self.presentation.identity()
    }

    /// Number of relations of the presentation.
    pub fn nr_rules(&self) -> usize {
        self.presentation.nr_rules()
    }

    /// The relations in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.presentation.relations().iter()
    }

    /// The relations as string pairs, in insertion order.
    pub fn rules_str(&self) -> Result<Vec<(String, String)>> {
        let alphabet = self.presentation.alphabet();
        self.presentation
            .relations()
            .iter()
            .map(|(u, v)| {
                Ok((
                    alphabet.string_from_word(u)?,
                    alphabet.string_from_word(v)?,
                ))
            })
            .collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // ---- heuristics ------------------------------------------------------

    /// Conservative syntactic test for an infinite quotient: `true` is a
    /// proof of infiniteness, `false` means unknown.
    ///
    /// A quotient is obviously infinite when there are no relations at all,
    /// when some letter occurs in no relation side that is a pure power of
    /// it (its powers are then pairwise incongruent: no relation can ever
    /// apply inside them), or when the letter-count difference matrix of
    /// the relations has rank below the alphabet size (the abelianised
    /// quotient is already infinite).
    pub fn is_obviously_infinite(&self) -> bool {
        let n = self.presentation.alphabet_size();
        if n == 0 {
            return false;
        }
        let relations = self.presentation.relations();
        if relations.is_empty() {
            return true;
        }
        'letters: for x in 0..n as Letter {
            for (u, v) in relations {
                if is_power_of(u, x) || is_power_of(v, x) {
                    continue 'letters;
                }
            }
            return true;
        }
        abelianised_rank(relations, n) < n
    }

    /// True iff a finite size is already known.
    pub fn is_obviously_finite(&self) -> bool {
        self.presentation.alphabet_size() == 0
            || self.size.map_or(false, |s| s != POSITIVE_INFINITY)
    }

    // ---- engine lifecycle ------------------------------------------------

    fn ensure_engines(&mut self) -> Result<()> {
        if self.presentation.alphabet_size() == 0 {
            return Err(Error::Presentation("the alphabet is empty".into()));
        }
        if self.kb.is_none() && self.kb_dead.is_none() {
            let mut kb = KnuthBendix::new(self.presentation.alphabet_size());
            kb.set_max_rules(self.settings.max_rules);
            let mut seeded = Ok(());
            for (u, v) in self.presentation.relations() {
                seeded = kb.add_rule(u, v);
                if seeded.is_err() {
                    break;
                }
            }
            match seeded {
                Ok(()) => self.kb = Some(kb),
                Err(err @ Error::ResourceExhausted(_)) => self.kb_dead = Some(err),
                Err(err) => return Err(err),
            }
        }
        if self.tc.is_none() && self.tc_dead.is_none() {
            let mut tc = match self.cayley_seed {
                Some(ref seed) => {
                    ToddCoxeter::from_cayley_seed(seed, self.presentation.relations().to_vec())
                }
                None => ToddCoxeter::from_presentation(&self.presentation),
            };
            tc.set_max_cosets(self.settings.max_cosets);
            self.tc = Some(tc);
        }
        self.presentation.freeze();
        Ok(())
    }

    fn ensure_kb_fp(&mut self) -> Result<()> {
        if self.kb_fp.is_some() {
            return Ok(());
        }
        let kb = match self.kb {
            Some(ref kb) => kb,
            None => return Err(Error::Unfinished),
        };
        let snapshot = Arc::new(kb.snapshot());
        let gens: Vec<KbElement> = (0..self.presentation.alphabet_size() as Letter)
            .map(|a| KbElement::new(Arc::clone(&snapshot), &[a]))
            .collect();
        self.kb_fp = Some(FroidurePin::new(gens));
        Ok(())
    }

    fn goal_reached(&self, goal: Goal) -> bool {
        let kb_done = self.kb.as_ref().map_or(false, |kb| kb.finished());
        let tc_done = self.tc.as_ref().map_or(false, |tc| tc.finished());
        match goal {
            Goal::WordProblem => kb_done || tc_done,
            Goal::Size => {
                tc_done || self.kb_fp.as_ref().map_or(false, |fp| fp.is_closed())
            }
        }
    }

    fn note_winner(&mut self) {
        if self.winner.is_some() {
            return;
        }
        if self.tc.as_ref().map_or(false, |tc| tc.finished()) {
            self.winner = Some(EngineKind::ToddCoxeter);
        } else if self.kb.as_ref().map_or(false, |kb| kb.finished()) {
            self.winner = Some(EngineKind::KnuthBendix);
        }
        if let Some(kind) = self.winner {
            if report::enabled() || self.settings.report {
                info!(winner = ?kind, "facade verdict engine");
            }
        }
    }

    /// Alternate `slice`-sized slices between the engines until the goal is
    /// reached or the control interrupts.
    fn race(&mut self, goal: Goal, ctl: &mut RunControl) -> Result<StepOutcome> {
        self.ensure_engines()?;
        loop {
            if self.goal_reached(goal) {
                self.note_winner();
                return Ok(StepOutcome::Finished);
            }
            if self.kb_dead.is_some() && self.tc_dead.is_some() {
                return Err(match self.tc_dead {
                    Some(ref err) => err.clone(),
                    None => Error::Unfinished,
                });
            }
            if !ctl.checkpoint() {
                return Ok(StepOutcome::Interrupted);
            }
            let slice = self.settings.slice;

            // Todd-Coxeter slice.
            if self.tc_dead.is_none() {
                let outcome = match self.tc {
                    Some(ref mut tc) if !tc.finished() => Some(tc.run_steps(slice)),
                    _ => None,
                };
                if let Some(Err(err)) = outcome {
                    match err {
                        Error::ResourceExhausted(_) => {
                            self.tc = None;
                            self.tc_dead = Some(err);
                        }
                        other => return Err(other),
                    }
                }
            }
            if self.goal_reached(goal) {
                continue;
            }

            // Knuth-Bendix slice: completion first, then (for a size
            // verdict) the normal-form enumeration.
            if self.kb_dead.is_none() {
                let outcome = match self.kb {
                    Some(ref mut kb) if !kb.finished() => Some(kb.run_steps(slice)),
                    _ => None,
                };
                if let Some(Err(err)) = outcome {
                    match err {
                        Error::ResourceExhausted(_) => {
                            self.kb = None;
                            self.kb_dead = Some(err);
                        }
                        other => return Err(other),
                    }
                }
                let kb_done = self.kb.as_ref().map_or(false, |kb| kb.finished());
                if kb_done && goal == Goal::Size {
                    self.ensure_kb_fp()?;
                    if let Some(ref mut fp) = self.kb_fp {
                        if !fp.is_closed() {
                            fp.run_steps(slice)?;
                        }
                    }
                }
            }
        }
    }

    // ---- queries ---------------------------------------------------------

    /// The number of elements of the presented semigroup, or
    /// [`POSITIVE_INFINITY`]. May run forever when finiteness is
    /// undecidable by the engines; use [`run_for`](Self::run_for) first to
    /// bound the attempt.
    pub fn size(&mut self) -> Result<usize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        if self.presentation.alphabet_size() == 0 {
            self.size = Some(0);
            return Ok(0);
        }
        if self.is_obviously_infinite() {
            self.size = Some(POSITIVE_INFINITY);
            return Ok(POSITIVE_INFINITY);
        }
        self.race(Goal::Size, &mut RunControl::forever())?;
        let size = self.verdict_size()?;
        self.size = Some(size);
        Ok(size)
    }

    fn verdict_size(&mut self) -> Result<usize> {
        if let Some(ref mut tc) = self.tc {
            if tc.finished() {
                return tc.nr_classes();
            }
        }
        match self.kb_fp {
            Some(ref fp) if fp.is_closed() => Ok(fp.current_size()),
            _ => Err(Error::Unfinished),
        }
    }

    /// Whether `u` and `v` name the same element.
    pub fn equal_to(&mut self, u: &[Letter], v: &[Letter]) -> Result<bool> {
        let u = self.presentation.canonical_word(u)?;
        let v = self.presentation.canonical_word(v)?;
        if u == v {
            return Ok(true);
        }
        self.ensure_engines()?;
        // Rewriting with the current rules is sound even before
        // confluence: equal normal forms prove congruence.
        if let Some(ref kb) = self.kb {
            if kb.currently_equal(&u, &v) {
                return Ok(true);
            }
        }
        self.race(Goal::WordProblem, &mut RunControl::forever())?;
        if let Some(ref kb) = self.kb {
            if kb.finished() {
                return Ok(kb.rewrite(&u) == kb.rewrite(&v));
            }
        }
        match self.tc {
            Some(ref mut tc) if tc.finished() => {
                Ok(tc.word_to_class(&u)? == tc.word_to_class(&v)?)
            }
            _ => Err(Error::Unfinished),
        }
    }

    /// As [`equal_to`](Self::equal_to), over strings.
    pub fn equal_to_str(&mut self, u: &str, v: &str) -> Result<bool> {
        let u = self.presentation.alphabet().word_from_str(u)?;
        let v = self.presentation.alphabet().word_from_str(v)?;
        self.equal_to(&u, &v)
    }

    /// The canonical form of `w`: the Knuth-Bendix normal form when the
    /// system is confluent, otherwise the shortlex-least word of the
    /// Todd-Coxeter class.
    pub fn normal_form(&mut self, w: &[Letter]) -> Result<Word> {
        let w = self.presentation.canonical_word(w)?;
        self.race(Goal::WordProblem, &mut RunControl::forever())?;
        if let Some(ref kb) = self.kb {
            if kb.finished() {
                return Ok(kb.rewrite(&w));
            }
        }
        match self.tc {
            Some(ref mut tc) if tc.finished() => {
                let class = tc.word_to_class(&w)?;
                tc.class_to_word(class)
            }
            _ => Err(Error::Unfinished),
        }
    }

    /// As [`normal_form`](Self::normal_form), over strings.
    pub fn normal_form_str(&mut self, w: &str) -> Result<String> {
        let w = self.presentation.alphabet().word_from_str(w)?;
        let nf = self.normal_form(&w)?;
        self.presentation.alphabet().string_from_word(&nf)
    }

    // ---- lifecycle observables and engine access -------------------------

    pub fn started(&self) -> bool {
        self.winner.is_some()
            || self.kb.as_ref().map_or(false, |kb| kb.started())
            || self.tc.as_ref().map_or(false, |tc| tc.started())
    }

    pub fn finished(&self) -> bool {
        self.size.is_some() || self.winner.is_some()
    }

    /// The engine whose verdict was cached, if any race has finished.
    pub fn winner(&self) -> Option<EngineKind> {
        self.winner
    }

    pub fn has_knuth_bendix(&self) -> bool {
        self.kb.is_some() || (!self.presentation.is_frozen() && self.kb_dead.is_none())
    }

    pub fn has_todd_coxeter(&self) -> bool {
        self.tc.is_some() || (!self.presentation.is_frozen() && self.tc_dead.is_none())
    }

    pub fn has_froidure_pin(&self) -> bool {
        self.kb_fp.is_some()
    }

    /// Direct access to the Knuth-Bendix engine (created on first use;
    /// freezes the presentation).
    pub fn knuth_bendix(&mut self) -> Result<&mut KnuthBendix> {
        self.ensure_engines()?;
        match self.kb {
            Some(ref mut kb) => Ok(kb),
            None => match self.kb_dead {
                Some(ref err) => Err(err.clone()),
                None => Err(Error::Unfinished),
            },
        }
    }

    /// Direct access to the Todd-Coxeter engine. If Knuth-Bendix has
    /// already produced a closed enumeration, a fresh engine seeded with
    /// its Cayley graph is handed out instead of the unfinished one.
    pub fn todd_coxeter(&mut self) -> Result<&mut ToddCoxeter> {
        self.ensure_engines()?;
        let reseed = self.tc.as_ref().map_or(true, |tc| !tc.finished())
            && self.kb_fp.as_ref().map_or(false, |fp| fp.is_closed());
        if reseed {
            if let Some(ref mut fp) = self.kb_fp {
                let seed = fp.cayley_seed()?;
                let mut tc =
                    ToddCoxeter::from_cayley_seed(&seed, self.presentation.relations().to_vec());
                tc.set_max_cosets(self.settings.max_cosets);
                self.tc = Some(tc);
                self.tc_dead = None;
            }
        }
        match self.tc {
            Some(ref mut tc) => Ok(tc),
            None => match self.tc_dead {
                Some(ref err) => Err(err.clone()),
                None => Err(Error::Unfinished),
            },
        }
    }

    /// The semigroup of Knuth-Bendix normal forms. Runs completion to
    /// confluence first; the returned enumeration may then be advanced or
    /// bounded by the caller.
    pub fn froidure_pin(&mut self) -> Result<&mut FroidurePin<KbElement>> {
        self.ensure_engines()?;
        if self.kb_fp.is_none() {
            match self.kb {
                Some(ref mut kb) => match kb.run()? {
                    StepOutcome::Finished => {}
                    _ => return Err(Error::Interrupted),
                },
                None => return Err(Error::Unfinished),
            }
            self.ensure_kb_fp()?;
        }
        match self.kb_fp {
            Some(ref mut fp) => Ok(fp),
            None => Err(Error::Unfinished),
        }
    }

    /// Advance the race towards a size verdict without blocking forever.
    pub fn run_for(&mut self, duration: Duration) -> Result<StepOutcome> {
        if self.presentation.alphabet_size() == 0 {
            self.size = Some(0);
            return Ok(StepOutcome::Finished);
        }
        if self.is_obviously_infinite() {
            self.size = Some(POSITIVE_INFINITY);
            return Ok(StepOutcome::Finished);
        }
        self.race(Goal::Size, &mut RunControl::for_duration(duration))
    }

    /// Run until a size verdict. May not terminate on an infinite quotient
    /// the heuristics cannot see.
    pub fn run(&mut self) -> Result<()> {
        if self.presentation.alphabet_size() == 0 {
            self.size = Some(0);
            return Ok(());
        }
        if self.is_obviously_infinite() {
            self.size = Some(POSITIVE_INFINITY);
            return Ok(());
        }
        self.race(Goal::Size, &mut RunControl::forever())?;
        Ok(())
    }
}

/// Rank over the integers of the letter-count difference matrix of the
/// relations: one row per relation, one column per letter, entry = number
/// of occurrences in `u` minus in `v`. Fraction-free elimination with gcd
/// reduction keeps the entries exact.
fn abelianised_rank(relations: &[Relation], n: usize) -> usize {
    let mut matrix: Vec<Vec<i64>> = Vec::with_capacity(relations.len());
    for (u, v) in relations {
        let mut row = vec![0i64; n];
        for &a in u.iter() {
            row[a as usize] += 1;
        }
        for &a in v.iter() {
            row[a as usize] -= 1;
        }
        if row.iter().any(|&x| x != 0) {
            matrix.push(row);
        }
    }
    let mut rank = 0;
    let mut row = 0;
    for col in 0..n {
        let pivot = (row..matrix.len()).find(|&r| matrix[r][col] != 0);
        let pivot = match pivot {
            Some(p) => p,
            None => continue,
        };
        matrix.swap(row, pivot);
        for r in row + 1..matrix.len() {
            if matrix[r][col] == 0 {
                continue;
            }
            let a = matrix[row][col] as i128;
            let b = matrix[r][col] as i128;
            for c in col..n {
                let value = a * matrix[r][c] as i128 - b * matrix[row][c] as i128;
                matrix[r][c] = value as i64;
            }
            let g = matrix[r][col..]
                .iter()
                .fold(0i64, |acc, &x| gcd(acc, x.abs()));
            if g > 1 {
                for c in col..n {
                    matrix[r][c] /= g;
                }
            }
        }
        rank += 1;
        row += 1;
        if row == matrix.len() {
            break;
        }
    }
    rank
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
#[path = "tests/fpsemigroup.rs"]
mod tests;
