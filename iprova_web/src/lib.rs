//! Browser implementations of the iProva client seams
//!
//! * [`DomFrameHost`] runs SAML redirect handshakes in hidden frames of the current
//!   document and listens for the token on the window's `message` event.
//! * [`AlertNotifier`] shows notifications with `window.alert`.
//! * [`FetchTransport`] sends requests with `fetch`, honoring the request's credentials
//!   mode.
//!
//! These types only work when compiled to `wasm32-unknown-unknown` and run in a browser.

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

mod alert;
mod fetch;
mod frames;

pub use alert::AlertNotifier;
pub use fetch::FetchTransport;
pub use frames::DomFrameHost;

use iprova_tokens::host::HostError;
use wasm_bindgen::JsValue;

fn window() -> Result<web_sys::Window, HostError> {
    web_sys::window().ok_or_else(|| HostError::new("not running in a browser window"))
}

fn js_error(context: &str, value: JsValue) -> HostError {
    HostError::new(format!("{}: {:?}", context, value))
}
