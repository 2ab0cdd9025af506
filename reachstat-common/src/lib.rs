//! Common types shared across the reachstat crates.
//!
//! This crate holds the error taxonomy used by both command-line tools and the
//! logging bootstrap every binary calls once at start-up. It stays small so the
//! client crates can depend on it without pulling in anything heavy.
//!
//! # Overview
//!
//! - [`ReachError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use reachstat_common::ReachError;
//!
//! let err = ReachError::Http { status: 502, message: "bad gateway".into() };
//! assert_eq!(err.to_string(), "HTTP error 502: bad gateway");
//! ```

pub mod observability;

/// Error types used across reachstat.
///
/// Configuration and validation failures happen before any network call;
/// the remaining variants describe what went wrong while talking to a remote
/// API or while exporting results.
#[derive(thiserror::Error, Debug)]
pub enum ReachError {
    /// Credentials or identifiers were missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A date could not be parsed at all.
    #[error("invalid date format '{0}', expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// Input parsed but violates a constraint (date order, span, post URL shape).
    #[error("validation error: {0}")]
    Validation(String),

    /// The request never produced a response.
    #[error("connection error: {0}")]
    Transport(String),

    #[error("authorization error: invalid OAuth token")]
    Unauthorized,

    #[error("access error: no permission to access the counter")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any other non-success status code.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// A successful response that carried an error payload.
    #[error("API error: {0}")]
    Api(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("failed to save CSV: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`ReachError`].
pub type Result<T> = std::result::Result<T, ReachError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            ReachError::Unauthorized.to_string(),
            "authorization error: invalid OAuth token"
        );
        assert_eq!(
            ReachError::InvalidDateFormat("2024/01/01".into()).to_string(),
            "invalid date format '2024/01/01', expected YYYY-MM-DD"
        );
        assert_eq!(
            ReachError::BadRequest("wrong metric".into()).to_string(),
            "bad request: wrong metric"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ReachError = io.into();
        assert!(matches!(err, ReachError::Io(_)));
        assert_eq!(err.to_string(), "gone");
    }
}
