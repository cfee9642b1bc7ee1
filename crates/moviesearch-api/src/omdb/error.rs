//! `OmdbError` - failures surfaced by the OMDb client.

use thiserror::Error;

/// Errors returned by the OMDb client and its response projections.
///
/// Nothing is recovered inside the client: every variant reaches the caller
/// of the operation that produced it.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum OmdbError {
    /// Connection failure, timeout, or unreadable body.
    #[error("OMDb request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("OMDb API error (HTTP {status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response body is not a JSON object.
    #[error("failed to decode OMDb response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A detail-only field was read from a response that lacks it.
    #[error("{key} is not in data, please make sure this is a detail response")]
    MissingDetailField {
        /// Response key that was expected.
        key: &'static str,
    },

    /// A field every response should carry is absent.
    #[error("{key} is not in data")]
    MissingField {
        /// Response key that was expected.
        key: &'static str,
    },

    /// A field is present but does not have the expected shape.
    #[error("malformed {field}: expected {expected}, got '{actual}'")]
    MalformedField {
        /// Response key of the offending value.
        field: &'static str,
        /// Description of the accepted shape.
        expected: &'static str,
        /// The value as received.
        actual: String,
    },

    /// The client could not be constructed.
    #[error("failed to build OMDb client: {0}")]
    Builder(String),
}

impl OmdbError {
    /// Returns `true` for network-level failures and non-success statuses.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }

    /// Builds a `MalformedField` from any displayable value.
    pub(crate) fn malformed(
        field: &'static str,
        expected: &'static str,
        actual: impl ToString,
    ) -> Self {
        Self::MalformedField {
            field,
            expected,
            actual: actual.to_string(),
        }
    }
}
