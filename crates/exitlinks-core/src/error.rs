//! Error types for the link engine.

use thiserror::Error;

/// Errors produced while classifying, rewriting, or validating links.
///
/// Only the two gate variants ever reach an end user. The others are
/// recovered where they occur: unparsable content is passed through and an
/// unresolvable host is treated as internal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The gate was reached without a `url` parameter.
    #[error("no URL provided")]
    MissingDestination,

    /// The `url` parameter is not an absolute http(s) URL once decoded.
    #[error("invalid URL provided: {0}")]
    InvalidDestination(String),

    /// The HTML fragment could not be scanned.
    #[error("unparsable content at byte {offset}: {reason}")]
    UnparsableContent {
        /// Byte offset where scanning stopped.
        offset: usize,
        /// What the scanner was looking for.
        reason: &'static str,
    },

    /// No host could be extracted from an href.
    #[error("cannot resolve host for {0:?}")]
    UnresolvableHost(String),

    /// The configured site URL is unusable as an origin.
    #[error("invalid site URL {url:?}: {reason}")]
    InvalidSiteUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl LinkError {
    /// Returns a stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::MissingDestination => "missing_destination",
            LinkError::InvalidDestination(_) => "invalid_destination",
            LinkError::UnparsableContent { .. } => "unparsable_content",
            LinkError::UnresolvableHost(_) => "unresolvable_host",
            LinkError::InvalidSiteUrl { .. } => "invalid_site_url",
        }
    }
}

/// Result type for link engine operations.
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_errors_have_user_facing_messages() {
        assert_eq!(LinkError::MissingDestination.to_string(), "no URL provided");
        assert!(LinkError::InvalidDestination("nope".into())
            .to_string()
            .starts_with("invalid URL provided"));
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            LinkError::MissingDestination.code(),
            LinkError::InvalidDestination(String::new()).code(),
            LinkError::UnparsableContent {
                offset: 0,
                reason: "",
            }
            .code(),
            LinkError::UnresolvableHost(String::new()).code(),
            LinkError::InvalidSiteUrl {
                url: String::new(),
                reason: String::new(),
            }
            .code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
