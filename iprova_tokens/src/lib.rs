//! Token acquisition and caching for iProva clients
//!
//! iProva supports several mutually exclusive logon methods. Some of them never need a
//! token (anonymous access and browser-managed session cookies); the others obtain one
//! through a method-specific flow:
//!
//! * Windows integrated authentication fetches the token from a dedicated endpoint,
//!   letting the browser negotiate credentials.
//! * ADFS, SAML2, and the server-selected SAML variant ask iProva for a redirect
//!   descriptor, load the identity provider into a hidden frame, and wait for the return
//!   page to post the token back as a cross-window message.
//!
//! A [`TokenCache`] sits in front of the [`AuthFlowExecutor`][sources::AuthFlowExecutor]
//! and keeps the most recent token until a caller forces a refresh, typically after the
//! server reported the token as expired.
//!
//! Everything here runs on a single thread. The network, the document, and the user are
//! reached through the [`Transport`], [`FrameHost`][host::FrameHost], and
//! [`Notifier`][report::Notifier] seams, none of which require `Send`.
//!
//! ```
//! use std::rc::Rc;
//!
//! use iprova_tokens::{
//!     report::TracingNotifier, sources::AuthFlowExecutor, BaseUrl, LogonMethod, TokenCache,
//! };
//! # use iprova_tokens::{Transport, TransportFailure, TransportRequest};
//! # struct NoTransport;
//! # #[async_trait::async_trait(?Send)]
//! # impl Transport for NoTransport {
//! #     async fn send(&self, _: TransportRequest) -> Result<String, TransportFailure> {
//! #         Err(TransportFailure::network("error", "offline"))
//! #     }
//! # }
//! # let transport = NoTransport;
//!
//! let executor = AuthFlowExecutor::new(
//!     BaseUrl::parse("https://iprova.example.com/iprova")?,
//!     LogonMethod::WindowsAuthentication,
//!     Rc::new(transport),
//!     Rc::new(TracingNotifier),
//! );
//!
//! let cache = TokenCache::new(executor);
//! assert!(cache.cached().is_none());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! * `testing`: Exposes scripted test doubles for every seam in the [`testing`] module.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod base_url;
mod braids;
mod cache;
pub mod host;
mod logon;
pub mod report;
pub mod sources;
#[cfg(any(test, feature = "testing"))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;
mod transport;

pub use base_url::{BaseUrl, InvalidBaseUrl};
pub use braids::*;
pub use cache::TokenCache;
pub use host::FrameIdGenerator;
pub use logon::{LogonMethod, UnknownLogonMethod};
pub use transport::{
    CredentialsMode, ErrorBody, Transport, TransportFailure, TransportRequest,
    TOKEN_EXPIRED_ERROR_CODE,
};
