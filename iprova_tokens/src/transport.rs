//! The HTTP seam used for every request to iProva

use async_trait::async_trait;
use http::{HeaderMap, Method};
use serde::Deserialize;
use thiserror::Error;

/// The iProva error code reported when a token is no longer accepted
pub const TOKEN_EXPIRED_ERROR_CODE: i64 = 1014;

/// Whether browser credentials (cookies, integrated authentication) go along with a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialsMode {
    /// Send credentials, including on cross-origin requests
    Include,
    /// Do not send credentials
    Omit,
}

/// A single outbound request
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// The HTTP method
    pub method: Method,
    /// The absolute request URL
    pub url: String,
    /// Additional request headers
    pub headers: HeaderMap,
    /// The value of the `Content-Type` header
    pub content_type: &'static str,
    /// The request body, if any
    pub body: Option<String>,
    /// The credentials policy for the request
    pub credentials: CredentialsMode,
}

impl TransportRequest {
    /// Constructs a body-less `GET` request
    pub fn get(url: String, content_type: &'static str, credentials: CredentialsMode) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            content_type,
            body: None,
            credentials,
        }
    }
}

/// The structured error body iProva returns for failed calls
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    /// The numeric iProva error code
    #[serde(default)]
    pub error_code: Option<i64>,
    /// A human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// A human-readable text, preferred over `message` when present
    #[serde(default)]
    pub text: Option<String>,
}

impl ErrorBody {
    /// The most specific human-readable description in the body
    pub fn detail(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.message.as_deref().filter(|m| !m.is_empty()))
    }
}

/// A failed request
#[derive(Clone, Debug, Error)]
#[error("{status_text}: {error_thrown}")]
pub struct TransportFailure {
    /// The failure category: `error`, `timeout`, `abort`, or `parsererror`
    pub status_text: String,
    /// The textual portion of the HTTP status, or the error raised while sending
    pub error_thrown: String,
    /// The HTTP status code, if a response was received
    pub status: Option<u16>,
    /// The parsed error body, if the response carried one
    pub body: Option<ErrorBody>,
}

impl TransportFailure {
    /// A failure for a response with a non-success status
    ///
    /// The raw body is kept only if it parses as an iProva error body.
    pub fn from_status(status: u16, reason: impl Into<String>, raw_body: &str) -> Self {
        Self {
            status_text: "error".to_owned(),
            error_thrown: reason.into(),
            status: Some(status),
            body: serde_json::from_str(raw_body).ok(),
        }
    }

    /// A failure where no response was received
    pub fn network(status_text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            error_thrown: error.into(),
            status: None,
            body: None,
        }
    }

    /// A response body that could not be parsed
    pub fn parser_error(error: &serde_json::Error) -> Self {
        Self::network("parsererror", error.to_string())
    }

    /// The iProva error code in the error body, if any
    #[inline]
    pub fn error_code(&self) -> Option<i64> {
        self.body.as_ref().and_then(|b| b.error_code)
    }

    /// Whether the server rejected the call because the token expired
    #[inline]
    pub fn is_token_expired(&self) -> bool {
        self.error_code() == Some(TOKEN_EXPIRED_ERROR_CODE)
    }
}

/// Performs HTTP requests on behalf of the client
///
/// Implementations run on a single thread, so the returned futures need not be `Send`.
#[async_trait(?Send)]
pub trait Transport {
    /// Sends a request and returns the raw response body on success
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    #[inline]
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        (**self).send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_token_expiry() {
        let failure = TransportFailure::from_status(
            401,
            "Unauthorized",
            r#"{"ErrorCode":1014,"Message":"Token expired"}"#,
        );

        assert!(failure.is_token_expired());
        assert_eq!(failure.body.unwrap().detail(), Some("Token expired"));
    }

    #[test]
    fn text_is_preferred_over_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"ErrorCode":12,"Message":"m","Text":"t"}"#).unwrap();
        assert_eq!(body.detail(), Some("t"));
    }

    #[test]
    fn non_json_error_bodies_are_dropped() {
        let failure = TransportFailure::from_status(500, "Internal Server Error", "<html>");

        assert_eq!(failure.status_text, "error");
        assert!(failure.body.is_none());
        assert!(!failure.is_token_expired());
    }
}
