use serde_json::Value;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for all SDK operations.
///
/// Local precondition failures surface as [`Error::Validation`] before any
/// network call. Remote failures are wrapped at the HTTP client boundary
/// into exactly one of the other three kinds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, oversized, or malformed field caught before any I/O.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Credentials or token rejected by the provider. Not retryable; the
    /// caller must re-authenticate.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Non-2xx response or malformed body from a remote call.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Network-level failure (timeout, refused connection). Kept distinct so
    /// callers can apply their own retry policy.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status,
            body: body.into(),
        }
    }

    /// Extract the OAuth-style error description from a provider payload, if
    /// the body carries one (`error` / `error_description` fields).
    pub fn oauth_error(body: &Value) -> Option<String> {
        let error = body.get("error")?.as_str()?;
        let description = body
            .get("error_description")
            .and_then(Value::as_str)
            .unwrap_or(error);
        Some(description.to_string())
    }
}
