//! The element capability consumed by Froidure-Pin.
//!
//! The enumeration engine needs nothing from a semigroup element beyond
//! equality, hashing, a copy, and a (fallible) product. Concrete element
//! types live with the host; the one element this crate ships is the
//! normal-form word over a published rewrite system, which is how a
//! completed Knuth-Bendix system becomes an enumerable semigroup.

use crate::error::{Error, Result};
use crate::rewrite::RewriteSnapshot;
use crate::word::{concat, Letter, Word};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A semigroup element, as far as the enumeration engine is concerned.
pub trait Element: Clone + Eq + Hash {
    /// The semigroup product. Errors are surfaced to the caller as
    /// [`Error::Element`].
    fn multiply(&self, other: &Self) -> Result<Self>;
}

/// An element of the semigroup presented by a confluent rewrite system:
/// a word in normal form. Equality and hashing look only at the word; the
/// shared snapshot supplies the product.
#[derive(Debug, Clone)]
pub struct KbElement {
    word: Word,
    system: Arc<RewriteSnapshot>,
}

impl KbElement {
    /// The element represented by `w`, reduced to normal form.
    pub fn new(system: Arc<RewriteSnapshot>, w: &[Letter]) -> Self {
        Self {
            word: system.rewrite(w),
            system,
        }
    }

    pub fn word(&self) -> &Word {
        &self.word
    }
}

impl PartialEq for KbElement {
    fn eq(&self, other: &Self) -> bool {
        self.word == other.word
    }
}

impl Eq for KbElement {}

impl Hash for KbElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.word.hash(state);
    }
}

impl Element for KbElement {
    fn multiply(&self, other: &Self) -> Result<Self> {
        let product = concat(&self.word, &other.word);
        Ok(Self {
            word: self.system.rewrite(&product),
            system: Arc::clone(&self.system),
        })
    }
}

/// Validate a product, mapping a foreign failure message into
/// [`Error::Element`]. Helper for hosts whose multiplication is partial.
pub fn element_error(msg: impl Into<String>) -> Error {
    Error::Element(msg.into())
}
