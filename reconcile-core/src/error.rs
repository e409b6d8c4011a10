//! Classified transport outcomes.

use thiserror::Error;

/// Every way a single GraphQL call can fail.
///
/// Variants are ordered the way responses are classified: configuration is
/// checked before any network call, then network, HTTP status, envelope
/// decoding, application errors and finally missing data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint or credentials missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection-level failure (DNS, refused, reset, timeout, token fetch).
    #[error("network error: {0}")]
    Network(String),

    /// The caller cancelled the call while it was in flight.
    #[error("request cancelled")]
    Cancelled,

    /// Non-2xx HTTP status.
    #[error("graphql http status {status} (content-type={content_type}): {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response content type, empty if absent.
        content_type: String,
        /// Raw response body.
        body: String,
    },

    /// The body (or the data inside it) did not have the expected shape.
    #[error(
        "failed to parse JSON response{}: {reason}. Response preview: {preview}",
        status_suffix(.status)
    )]
    Decode {
        /// HTTP status code, when the failure was in the envelope itself.
        /// `None` once the envelope has been classified and only a root
        /// field failed to decode.
        status: Option<u16>,
        /// Parser failure.
        reason: String,
        /// Leading characters of the offending text.
        preview: String,
    },

    /// The envelope carried one or more GraphQL errors.
    #[error("graphql error: {message}")]
    Application {
        /// Message of the first error.
        message: String,
    },

    /// A payload was expected but `data` was absent or null.
    #[error("graphql response missing data")]
    MissingData,
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (status {status})"),
        None => String::new(),
    }
}
