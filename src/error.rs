use thiserror::Error;

/// Errors produced while normalizing or dispatching a request.
///
/// Normalization failures are synchronous and occur before any network
/// activity. Transport and cancellation failures surface asynchronously
/// from the underlying client. None of these are retried internally; the
/// caller owns interpretation and retry policy.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Supplied method, uppercased, is not one of the nine HTTP verbs.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A header name could not be parsed into a canonical header name.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// The value supplied for the named header contains invalid characters.
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(String),

    /// A form-data payload did not serialize to a key/value mapping.
    #[error("form-data payload is not a key/value mapping")]
    InvalidFormPayload,

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A JSON or form-data payload could not be stringified.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The timeout elapsed or a caller-supplied cancellation token fired
    /// before the request settled. The two cases are not distinguished.
    #[error("request cancelled before completion")]
    Cancelled,

    /// Failure raised by the underlying HTTP client, passed through
    /// unchanged. HTTP 4xx/5xx responses are not errors.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
