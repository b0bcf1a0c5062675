//! Error types for the lirskit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are
//!   invalid (zero capacity, out-of-range HIR ratio).
//! - [`InvariantError`]: Returned when internal bookkeeping invariants are
//!   violated (debug-oriented `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use lirskit::error::ConfigError;
//! use lirskit::policy::lirs::LirsCache;
//!
//! // Fallible constructor for user-configurable parameters
//! let cache: Result<LirsCache<u64, String>, ConfigError> =
//!     LirsCache::try_with_hir_ratio(100, 0.05);
//! assert!(cache.is_ok());
//!
//! // Invalid ratio is caught without panicking
//! let bad = LirsCache::<u64, String>::try_with_hir_ratio(100, 1.0);
//! assert_eq!(bad.unwrap_err(), ConfigError::HirRatioOutOfRange(1.0));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`LirsCache::try_new`](crate::policy::lirs::LirsCache::try_new) and
/// [`LirsCache::try_with_hir_ratio`](crate::policy::lirs::LirsCache::try_with_hir_ratio).
/// Construction either succeeds with a fully initialised engine or fails
/// without allocating one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `capacity` was zero; the cache needs at least one resident slot.
    ZeroCapacity,
    /// `hir_ratio` fell outside the open interval (0, 1).
    ///
    /// A ratio of exactly 1 would leave no LIR capacity at all and the
    /// policy would degenerate to plain FIFO over the HIR queue.
    HirRatioOutOfRange(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => f.write_str("capacity must be greater than 0"),
            ConfigError::HirRatioOutOfRange(ratio) => {
                write!(f, "hir_ratio must be in the open interval (0, 1), got {ratio}")
            },
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`LirsCache::check_invariants`](crate::policy::lirs::LirsCache::check_invariants),
/// which tests and debug builds run after mutating operations. Carries a
/// human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_display_zero_capacity() {
        let err = ConfigError::ZeroCapacity;
        assert_eq!(err.to_string(), "capacity must be greater than 0");
    }

    #[test]
    fn config_display_ratio_includes_value() {
        let err = ConfigError::HirRatioOutOfRange(1.5);
        assert!(err.to_string().contains("1.5"));
        assert!(err.to_string().contains("(0, 1)"));
    }

    #[test]
    fn config_is_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("queue length mismatch");
        assert_eq!(err.to_string(), "queue length mismatch");
        assert_eq!(err.message(), "queue length mismatch");
    }

    #[test]
    fn invariant_clone_and_eq() {
        let a = InvariantError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn invariant_is_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }
}
