//! Finite presentations: an alphabet, an optional identity letter, and a
//! list of defining relations.
//!
//! A presentation is built monotonically and frozen when the first engine
//! starts; any mutation afterwards fails with `PresentationFrozen`.

use crate::error::{Error, Result};
use crate::word::{word, Alphabet, Letter, Word};

/// A relation `u = v`, stored ordered but used symmetrically.
pub type Relation = (Word, Word);

#[derive(Debug, Clone, Default)]
pub struct Presentation {
    alphabet: Alphabet,
    alphabet_set: bool,
    identity: Option<Letter>,
    relations: Vec<Relation>,
    frozen: bool,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::PresentationFrozen);
        }
        Ok(())
    }

    /// Set the alphabet to `size` anonymous letters. May be called once.
    pub fn set_alphabet(&mut self, size: usize) -> Result<()> {
        self.check_mutable()?;
        if self.alphabet_set {
            return Err(Error::Presentation("alphabet is already set".into()));
        }
        self.alphabet = Alphabet::new(size);
        self.alphabet_set = true;
        Ok(())
    }

    /// Set the alphabet from a character set, enabling the string API.
    pub fn set_alphabet_chars(&mut self, charset: &str) -> Result<()> {
        self.check_mutable()?;
        if self.alphabet_set {
            return Err(Error::Presentation("alphabet is already set".into()));
        }
        self.alphabet = Alphabet::from_chars(charset)?;
        self.alphabet_set = true;
        Ok(())
    }

    /// Declare `e` the identity: adds `e·x = x` and `x·e = x` for every
    /// letter `x` (and `e·e = e`) to the relation list.
    pub fn set_identity(&mut self, e: Letter) -> Result<()> {
        self.check_mutable()?;
        self.alphabet.validate_letter(e)?;
        if let Some(old) = self.identity {
            return Err(Error::Presentation(format!(
                "identity is already set to letter {}",
                old
            )));
        }
        self.identity = Some(e);
        for x in 0..self.alphabet.size() as Letter {
            if x == e {
                self.relations.push((word(&[e, e]), word(&[e])));
            } else {
                self.relations.push((word(&[e, x]), word(&[x])));
                self.relations.push((word(&[x, e]), word(&[x])));
            }
        }
        Ok(())
    }

    /// As [`set_identity`], addressed by character.
    pub fn set_identity_char(&mut self, c: char) -> Result<()> {
        let e = self.alphabet.letter(c).ok_or_else(|| {
            Error::Presentation(format!("identity character '{}' is not a letter", c))
        })?;
        self.set_identity(e)
    }

    /// Add the relation `u = v`.
    pub fn add_rule(&mut self, u: &[Letter], v: &[Letter]) -> Result<()> {
        self.check_mutable()?;
        let u = self.canonical_word(u)?;
        let v = self.canonical_word(v)?;
        self.relations.push((u, v));
        Ok(())
    }

    /// Add the relation `u = v` given as strings over the charset.
    pub fn add_rule_str(&mut self, u: &str, v: &str) -> Result<()> {
        let u = self.alphabet.word_from_str(u)?;
        let v = self.alphabet.word_from_str(v)?;
        self.add_rule(&u, &v)
    }

    /// Validate a query word and normalise the empty word to the identity
    /// letter. The empty word is only meaningful when an identity is set.
    pub fn canonical_word(&self, w: &[Letter]) -> Result<Word> {
        self.alphabet.validate_word(w)?;
        if w.is_empty() {
            return match self.identity {
                Some(e) => Ok(word(&[e])),
                None => Err(Error::Presentation(
                    "the empty word is not an element: no identity is set".into(),
                )),
            };
        }
        Ok(word(w))
    }

    /// Freeze the presentation; later mutation fails.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet.size()
    }

    pub fn identity(&self) -> Option<Letter> {
        self.identity
    }

    /// The relations in insertion order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn nr_rules(&self) -> usize {
        self.relations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_injects_unit_relations() {
        let mut p = Presentation::new();
        p.set_alphabet(3).unwrap();
        p.set_identity(0).unwrap();
        // ee = e, plus two rules per non-identity letter.
        assert_eq!(p.nr_rules(), 5);
        assert_eq!(p.relations()[0], (word(&[0, 0]), word(&[0])));
        assert_eq!(p.relations()[1], (word(&[0, 1]), word(&[1])));
    }

    #[test]
    fn frozen_presentation_rejects_mutation() {
        let mut p = Presentation::new();
        p.set_alphabet(2).unwrap();
        p.add_rule(&[0, 0], &[0]).unwrap();
        p.freeze();
        assert_eq!(p.add_rule(&[1], &[0]), Err(Error::PresentationFrozen));
        assert_eq!(p.set_identity(0), Err(Error::PresentationFrozen));
    }

    #[test]
    fn out_of_range_relation_rejected() {
        let mut p = Presentation::new();
        p.set_alphabet(2).unwrap();
        assert!(p.add_rule(&[0, 2], &[0]).is_err());
    }

    #[test]
    fn empty_side_needs_an_identity() {
        let mut p = Presentation::new();
        p.set_alphabet(2).unwrap();
        assert!(p.add_rule(&[], &[0]).is_err());
        p.set_identity(0).unwrap();
        p.add_rule(&[], &[1]).unwrap();
        let last = p.relations().last().unwrap();
        assert_eq!(last.0.as_slice(), &[0], "empty side becomes the identity letter");
    }

    #[test]
    fn string_rules_go_through_the_charset() {
        let mut p = Presentation::new();
        p.set_alphabet_chars("ab").unwrap();
        p.add_rule_str("aaa", "a").unwrap();
        assert_eq!(p.relations()[0], (word(&[0, 0, 0]), word(&[0])));
    }
}
