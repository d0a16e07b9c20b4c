//! Error types.
//!
//! Cache operations never return recoverable errors — lookups miss with
//! `None` and misuse panics. The one error type here backs the debug-only
//! `check_invariants` methods on the engine and the ARC policy, which
//! report *which* structural invariant broke instead of panicking mid-test.

use std::fmt;

/// Error returned when an internal cache invariant is violated.
///
/// Produced by `check_invariants` methods (compiled under
/// `#[cfg(any(test, debug_assertions))]`); carries a human-readable
/// description of the failed invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates an `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message() {
        let err = InvariantError::new("index and collection disagree");
        assert_eq!(err.to_string(), "index and collection disagree");
        assert_eq!(err.message(), "index and collection disagree");
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }
}
