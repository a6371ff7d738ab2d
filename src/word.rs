//! Words over a finite alphabet.
//!
//! A letter is a dense index into the alphabet; a word is a small-vector of
//! letters. The alphabet optionally carries a bijection to printable
//! characters so words can be parsed from and rendered as strings.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A letter: an index into the alphabet, `< alphabet_size`.
pub type Letter = u32;

/// A word: a finite ordered sequence of letters.
///
/// Most words in presentations and rule sets are short, so the first eight
/// letters live inline.
pub type Word = SmallVec<[Letter; 8]>;

/// Build a word from a slice of letters.
pub fn word(letters: &[Letter]) -> Word {
    SmallVec::from_slice(letters)
}

/// Concatenate two words.
pub fn concat(u: &[Letter], v: &[Letter]) -> Word {
    let mut out = Word::with_capacity(u.len() + v.len());
    out.extend_from_slice(u);
    out.extend_from_slice(v);
    out
}

/// True iff `factor` occurs as a contiguous factor of `w`.
pub fn is_factor(w: &[Letter], factor: &[Letter]) -> bool {
    if factor.is_empty() {
        return true;
    }
    if factor.len() > w.len() {
        return false;
    }
    w.windows(factor.len()).any(|win| win == factor)
}

/// True iff `w` is a pure power `x^k` (`k >= 1`) of the letter `x`.
pub fn is_power_of(w: &[Letter], x: Letter) -> bool {
    !w.is_empty() && w.iter().all(|&a| a == x)
}

/// A finite alphabet of `size` letters, optionally mapped 1:1 onto printable
/// characters.
#[derive(Debug, Clone, Default)]
pub struct Alphabet {
    size: usize,
    chars: Option<Vec<char>>,
    positions: FxHashMap<char, Letter>,
}

impl Alphabet {
    /// An alphabet of `size` letters with no character mapping.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            chars: None,
            positions: FxHashMap::default(),
        }
    }

    /// An alphabet whose letters are the characters of `charset`, in order.
    ///
    /// Fails on an empty charset or a repeated character.
    pub fn from_chars(charset: &str) -> Result<Self> {
        if charset.is_empty() {
            return Err(Error::Presentation("alphabet must be non-empty".into()));
        }
        let chars: Vec<char> = charset.chars().collect();
        let mut positions = FxHashMap::default();
        for (i, &c) in chars.iter().enumerate() {
            if positions.insert(c, i as Letter).is_some() {
                return Err(Error::Presentation(format!(
                    "duplicate letter '{}' in alphabet",
                    c
                )));
            }
        }
        Ok(Self {
            size: chars.len(),
            chars: Some(chars),
            positions,
        })
    }

    /// Number of letters.
    pub fn size(&self) -> usize {
        self.size
    }

    /// True iff a character mapping was supplied.
    pub fn has_chars(&self) -> bool {
        self.chars.is_some()
    }

    /// The letter for a character, if the alphabet maps it.
    pub fn letter(&self, c: char) -> Option<Letter> {
        self.positions.get(&c).copied()
    }

    /// The character for a letter, if a mapping was supplied.
    pub fn char_for(&self, a: Letter) -> Option<char> {
        self.chars.as_ref().and_then(|cs| cs.get(a as usize)).copied()
    }

    /// Check that every letter of `w` is in range.
    pub fn validate_word(&self, w: &[Letter]) -> Result<()> {
        for &a in w {
            if a as usize >= self.size {
                return Err(Error::Presentation(format!(
                    "letter {} out of range for alphabet of size {}",
                    a, self.size
                )));
            }
        }
        Ok(())
    }

    /// Check a single letter is in range.
    pub fn validate_letter(&self, a: Letter) -> Result<()> {
        if a as usize >= self.size {
            return Err(Error::Presentation(format!(
                "letter {} out of range for alphabet of size {}",
                a, self.size
            )));
        }
        Ok(())
    }

    /// Parse a string into a word through the character mapping.
    pub fn word_from_str(&self, s: &str) -> Result<Word> {
        if self.chars.is_none() {
            return Err(Error::Presentation(
                "alphabet has no character mapping".into(),
            ));
        }
        let mut out = Word::with_capacity(s.len());
        for c in s.chars() {
            match self.letter(c) {
                Some(a) => out.push(a),
                None => {
                    return Err(Error::Presentation(format!(
                        "character '{}' is not a letter of the alphabet",
                        c
                    )))
                }
            }
        }
        Ok(out)
    }

    /// Render a word as a string through the character mapping.
    pub fn string_from_word(&self, w: &[Letter]) -> Result<String> {
        let mut out = String::with_capacity(w.len());
        for &a in w {
            match self.char_for(a) {
                Some(c) => out.push(c),
                None => {
                    return Err(Error::Presentation(format!(
                        "letter {} has no character in the alphabet",
                        a
                    )))
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_search_finds_interior_factor() {
        assert!(is_factor(&[0, 1, 2, 1], &[1, 2]));
        assert!(!is_factor(&[0, 1, 2, 1], &[2, 2]));
        assert!(is_factor(&[0], &[]), "empty word is a factor of everything");
    }

    #[test]
    fn power_detection() {
        assert!(is_power_of(&[1, 1, 1], 1));
        assert!(!is_power_of(&[1, 0, 1], 1));
        assert!(!is_power_of(&[], 1), "the empty word is not a power");
    }

    #[test]
    fn charset_round_trip() {
        let a = Alphabet::from_chars("abc").unwrap();
        let w = a.word_from_str("cab").unwrap();
        assert_eq!(w.as_slice(), &[2, 0, 1]);
        assert_eq!(a.string_from_word(&w).unwrap(), "cab");
    }

    #[test]
    fn duplicate_charset_rejected() {
        assert!(Alphabet::from_chars("aba").is_err());
    }

    #[test]
    fn out_of_range_letter_rejected() {
        let a = Alphabet::new(2);
        assert!(a.validate_word(&[0, 1]).is_ok());
        assert!(a.validate_word(&[0, 2]).is_err());
    }

    #[test]
    fn unknown_character_rejected() {
        let a = Alphabet::from_chars("01").unwrap();
        assert!(a.word_from_str("012").is_err());
    }
}
