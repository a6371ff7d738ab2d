//! Shared test helpers: a concrete element type for exercising the
//! enumeration engine against a real semigroup.

use crate::element::Element;
use crate::error::{Error, Result};

/// A transformation of `{0, .., n-1}`, stored as its image list. Products
/// compose left to right: `(x)(f * g) = ((x)f)g`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Transf(pub Vec<u8>);

impl Transf {
    pub fn new(images: &[u8]) -> Self {
        Transf(images.to_vec())
    }
}

impl Element for Transf {
    fn multiply(&self, other: &Self) -> Result<Self> {
        if self.0.len() != other.0.len() {
            return Err(Error::Element(format!(
                "degree mismatch: {} vs {}",
                self.0.len(),
                other.0.len()
            )));
        }
        Ok(Transf(self.0.iter().map(|&x| other.0[x as usize]).collect()))
    }
}
