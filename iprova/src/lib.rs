//! Client for the iProva RPC-style and REST APIs
//!
//! An [`IProvaClient`] calls iProva on behalf of a user authenticated through one of the
//! [`LogonMethod`]s. Tokens are obtained on first use, cached, and refreshed once when
//! iProva reports them as expired.
//!
//! Two call styles are supported:
//!
//! * [`RestCall`]s address `{base URL}{path}` with a regular HTTP method and an optional
//!   JSON body. Tokens travel in the `Authorization` header.
//! * [`RpcCall`]s post their parameters to a function of a legacy web service endpoint.
//!   The credentials travel in the `objCredentials` parameter.
//!
//! ```
//! use iprova::{ClientConfig, IProvaClient, LogonMethod, RestCall};
//! # use iprova_tokens::{Transport, TransportFailure, TransportRequest};
//! # struct EchoTransport;
//! # #[async_trait::async_trait(?Send)]
//! # impl Transport for EchoTransport {
//! #     async fn send(&self, _: TransportRequest) -> Result<String, TransportFailure> {
//! #         Ok("[]".to_owned())
//! #     }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let transport = EchoTransport;
//!
//! let config = ClientConfig::builder("https://iprova.example.com/iprova")
//!     .logon_method(LogonMethod::Cookie)
//!     .build()?;
//!
//! let client = IProvaClient::builder(config, transport).build()?;
//! let items = client.call_rest(&RestCall::get("api/items")).await?;
//! # assert!(items.is_array());
//! # Ok(())
//! # }
//! ```
//!
//! Logon methods using a SAML redirect handshake need a
//! [`FrameHost`][iprova_tokens::host::FrameHost], supplied through
//! [`ClientBuilder::frame_host`].

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

mod client;
mod config;
mod error;
mod rest;
mod rpc;

pub use client::{ClientBuilder, IProvaClient};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use error::CallError;
pub use iprova_tokens::LogonMethod;
pub use rest::{RestCall, API_KEY_HEADER, API_VERSION_HEADER};
pub use rpc::{RpcCall, CREDENTIALS_PARAMETER};
