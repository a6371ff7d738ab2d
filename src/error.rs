//! Crate-wide error type.

use std::fmt;

/// Errors produced by presentations, engines, and the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid alphabet, out-of-range letter, empty relation side, or an
    /// identity letter outside the alphabet.
    Presentation(String),
    /// Mutation of a presentation after an engine has started.
    PresentationFrozen,
    /// An engine hit its configured rule or coset cap.
    ResourceExhausted(String),
    /// Cancelled or deadline reached; engine state is valid and resumable.
    Interrupted,
    /// The query needs a complete verdict that no engine has produced yet.
    Unfinished,
    /// Host-provided multiplication signalled failure.
    Element(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Presentation(msg) => write!(f, "invalid presentation: {}", msg),
            Error::PresentationFrozen => {
                write!(f, "presentation is frozen: an engine has already started")
            }
            Error::ResourceExhausted(what) => write!(f, "resource exhausted: {}", what),
            Error::Interrupted => write!(f, "interrupted; engine state is resumable"),
            Error::Unfinished => write!(f, "no engine has finished; result unavailable"),
            Error::Element(msg) => write!(f, "element operation failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_kind() {
        let e = Error::ResourceExhausted("max_cosets (16777216) reached".into());
        assert!(e.to_string().contains("max_cosets"));
        assert!(Error::PresentationFrozen.to_string().contains("frozen"));
    }
}
