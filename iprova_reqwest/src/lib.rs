//! A [`Transport`] sending iProva requests through `reqwest`
//!
//! Requests go through a [`ClientWithMiddleware`], so any
//! [`reqwest_middleware`] stack can be placed in front of iProva.
//!
//! ```
//! use iprova_reqwest::ReqwestTransport;
//! use reqwest::Client;
//! use reqwest_middleware::ClientBuilder;
//!
//! let client = ClientBuilder::new(Client::default()).build();
//! let transport = ReqwestTransport::with_middleware(client);
//! # let _ = transport;
//! ```
//!
//! Browser credentials have no per-request equivalent here. Cookies are sent whenever the
//! underlying client has a cookie store, regardless of the request's
//! [`CredentialsMode`][iprova_tokens::CredentialsMode].

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

use async_trait::async_trait;
use iprova_tokens::{Transport, TransportFailure, TransportRequest};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;

/// Sends requests with a `reqwest` client
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
}

impl ReqwestTransport {
    /// Constructs a transport over a plain client
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_middleware(client.into())
    }

    /// Constructs a transport over a client with a middleware stack
    pub fn with_middleware(client: ClientWithMiddleware) -> Self {
        Self { client }
    }
}

fn send_failure(error: reqwest_middleware::Error) -> TransportFailure {
    let status_text = match &error {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => "timeout",
        _ => "error",
    };

    TransportFailure::network(status_text, error.to_string())
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    #[tracing::instrument(err, skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        tracing::trace!(credentials = ?request.credentials, "sending request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .header(header::CONTENT_TYPE, request.content_type);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(send_failure)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure::network("error", e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportFailure::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::{Client, Request, Response};
    use reqwest_middleware::{ClientBuilder, Middleware, Next, Result};

    use super::*;

    struct Seen {
        method: String,
        url: String,
        content_type: Option<String>,
        authorization: Option<String>,
        body: Option<String>,
    }

    struct Responder {
        status: u16,
        body: &'static str,
        seen: Mutex<Option<Seen>>,
    }

    impl Responder {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(None),
            })
        }
    }

    fn header_str(req: &Request, name: header::HeaderName) -> Option<String> {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    #[async_trait::async_trait]
    impl Middleware for Responder {
        async fn handle(
            &self,
            req: Request,
            _: &mut http::Extensions,
            _: Next<'_>,
        ) -> Result<Response> {
            let seen = Seen {
                method: req.method().to_string(),
                url: req.url().to_string(),
                content_type: header_str(&req, header::CONTENT_TYPE),
                authorization: header_str(&req, header::AUTHORIZATION),
                body: req
                    .body()
                    .and_then(|b| b.as_bytes())
                    .map(|b| String::from_utf8_lossy(b).into_owned()),
            };
            *self.seen.lock().unwrap() = Some(seen);

            let response = http::Response::builder()
                .status(self.status)
                .body(self.body)
                .unwrap();

            Ok(response.into())
        }
    }

    fn transport(responder: &Arc<Responder>) -> ReqwestTransport {
        ReqwestTransport::with_middleware(
            ClientBuilder::new(Client::default())
                .with_arc(responder.clone())
                .build(),
        )
    }

    fn post_request() -> TransportRequest {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_static("token abc123"),
        );

        TransportRequest {
            method: http::Method::POST,
            headers,
            body: Some(r#"{"title":"Manual"}"#.to_owned()),
            ..TransportRequest::get(
                "https://iprova.example.com/items".to_owned(),
                "application/json",
                iprova_tokens::CredentialsMode::Omit,
            )
        }
    }

    mod when_the_call_succeeds {
        use super::*;

        #[tokio::test]
        async fn returns_the_body_and_forwards_the_request() {
            let responder = Responder::new(200, r#"{"id":2}"#);

            let body = transport(&responder).send(post_request()).await.unwrap();

            assert_eq!(body, r#"{"id":2}"#);

            let seen = responder.seen.lock().unwrap().take().unwrap();
            assert_eq!(seen.method, "POST");
            assert_eq!(seen.url, "https://iprova.example.com/items");
            assert_eq!(seen.content_type.as_deref(), Some("application/json"));
            assert_eq!(seen.authorization.as_deref(), Some("token abc123"));
            assert_eq!(seen.body.as_deref(), Some(r#"{"title":"Manual"}"#));
        }
    }

    mod when_the_call_fails {
        use super::*;

        #[tokio::test]
        async fn parses_the_error_body() {
            let responder = Responder::new(401, r#"{"ErrorCode":1014,"Message":"Token expired"}"#);

            let failure = transport(&responder)
                .send(post_request())
                .await
                .unwrap_err();

            assert_eq!(failure.status_text, "error");
            assert_eq!(failure.error_thrown, "Unauthorized");
            assert_eq!(failure.status, Some(401));
            assert!(failure.is_token_expired());
        }

        #[tokio::test]
        async fn keeps_failures_without_an_error_body() {
            let responder = Responder::new(500, "<html></html>");

            let failure = transport(&responder)
                .send(post_request())
                .await
                .unwrap_err();

            assert_eq!(failure.error_thrown, "Internal Server Error");
            assert!(failure.body.is_none());
        }
    }
}
