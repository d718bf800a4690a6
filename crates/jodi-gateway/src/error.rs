//! Gateway errors.

use thiserror::Error;

/// Errors from REST calls and the socket transport.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server rejected the credentials (401/403). Callers should treat
    /// this as a sign-in redirect, not a retryable failure.
    #[error("not authorized")]
    Forbidden,

    /// The server answered with an unexpected status code.
    #[error("unexpected http status {status}")]
    Http {
        /// Response status code.
        status: u16,
    },

    /// The request never produced a response (connect, DNS, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body did not decode into the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Malformed(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Http { status: status.as_u16() };
        }
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_lowercase_messages() {
        assert_eq!(GatewayError::Forbidden.to_string(), "not authorized");
        assert_eq!(GatewayError::Http { status: 500 }.to_string(), "unexpected http status 500");
        assert_eq!(
            GatewayError::Malformed("missing field".to_string()).to_string(),
            "malformed response: missing field"
        );
    }
}
