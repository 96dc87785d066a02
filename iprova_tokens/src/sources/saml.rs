//! Tokens obtained through a SAML redirect handshake (SAML2, ADFS, or server-selected)
//!
//! iProva describes where the browser has to go to authenticate the user. The handshake
//! loads that target into a hidden frame and waits for the identity provider's return
//! page to post the token back to this window.

use std::time::Duration;

use futures::{FutureExt, StreamExt};
use serde::Deserialize;

use crate::{
    host::{FrameHost, FrameName},
    report::{report_failure, Notifier, TOKEN_REQUEST_TEMPLATE},
    sources::AuthError,
    transport::{CredentialsMode, TransportRequest},
    BaseUrl, Token, Transport, TransportFailure,
};

/// Path of the descriptor endpoint, relative to the base URL
pub const DESCRIPTOR_PATH: &str = "api/saml";

/// How long to wait for the token message before revealing the frame
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the form field carrying the SAML request payload
pub const SAML_REQUEST_FIELD: &str = "SAMLRequest";

const TIMEOUT_MESSAGE: &str = "Timeout while waiting for token message from iFrame, frame will be made visible after closing this alert";

/// How the browser must reach the identity provider
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedirectMethod {
    /// Load the URL into the frame
    Get,
    /// Post the payload to the URL from a form targeting the frame
    Post,
}

/// Where and how to start the redirect handshake, as described by iProva
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SamlDescriptor {
    /// The request method
    pub method: RedirectMethod,
    /// The identity provider URL
    pub url: String,
    /// The payload to post, for [`RedirectMethod::Post`]
    #[serde(default)]
    pub post_data: Option<String>,
}

/// The message field carrying the token
pub const TOKEN_FIELD: &str = "iProvaToken";

/// Extracts the token from a cross-window message
///
/// Anything that is not a JSON object with a non-empty `iProvaToken` string is
/// not a token message.
pub fn parse_token_message(raw: &str) -> Option<Token> {
    let message: serde_json::Value = serde_json::from_str(raw).ok()?;
    message
        .get(TOKEN_FIELD)?
        .as_str()
        .filter(|t| !t.is_empty())
        .map(|t| Token::from(t.to_owned()))
}

/// Requests the handshake descriptor
///
/// `variant` selects a specific SAML flavor; without it, iProva picks the variant
/// matching its auto-login configuration.
#[tracing::instrument(err, skip(transport, notifier, base_url), fields(base_url = %base_url))]
pub async fn fetch_descriptor(
    transport: &dyn Transport,
    notifier: &dyn Notifier,
    base_url: &BaseUrl,
    variant: Option<&str>,
) -> Result<SamlDescriptor, AuthError> {
    let mut url = base_url.join(DESCRIPTOR_PATH);
    if let Some(variant) = variant {
        url.push('/');
        url.push_str(variant);
    }

    let request = TransportRequest::get(url, "application/json", CredentialsMode::Omit);

    let body = match transport.send(request).await {
        Ok(body) => body,
        Err(failure) => {
            report_failure(notifier, &failure, TOKEN_REQUEST_TEMPLATE);
            return Err(failure.into());
        }
    };

    match serde_json::from_str::<SamlDescriptor>(&body) {
        Ok(descriptor) => {
            tracing::debug!(
                method = ?descriptor.method,
                url = %descriptor.url,
                "received SAML descriptor"
            );
            Ok(descriptor)
        }
        Err(error) => {
            report_failure(
                notifier,
                &TransportFailure::parser_error(&error),
                TOKEN_REQUEST_TEMPLATE,
            );
            Err(AuthError::MalformedDescriptor(error))
        }
    }
}

enum HandshakeEvent {
    Message(Option<String>),
    TimedOut,
}

/// Runs the redirect handshake in a hidden frame named `frame`
///
/// Messages that do not carry a token are ignored. Once the timeout elapses, the user
/// is notified and the frame is revealed, but the handshake keeps waiting: the revealed
/// frame lets the user complete a login page that needs interaction.
#[tracing::instrument(err, skip_all, fields(frame = %frame))]
pub async fn run_handshake(
    host: &dyn FrameHost,
    notifier: &dyn Notifier,
    frame: FrameName,
    descriptor: &SamlDescriptor,
) -> Result<Token, AuthError> {
    host.create_hidden_frame(&frame)?;

    let messages = match host.subscribe_messages() {
        Ok(messages) => messages,
        Err(error) => {
            host.remove_frame(&frame);
            return Err(error.into());
        }
    };

    let started = match descriptor.method {
        RedirectMethod::Post => host.post_to_frame(
            &frame,
            &descriptor.url,
            SAML_REQUEST_FIELD,
            descriptor.post_data.as_deref().unwrap_or_default(),
        ),
        RedirectMethod::Get => host.navigate_frame(&frame, &descriptor.url),
    };
    if let Err(error) = started {
        host.remove_frame(&frame);
        return Err(error.into());
    }

    let mut messages = messages.fuse();
    let mut timeout = host.delay(HANDSHAKE_TIMEOUT).fuse();

    loop {
        let event = futures::select! {
            message = messages.next() => HandshakeEvent::Message(message),
            () = timeout => HandshakeEvent::TimedOut,
        };

        match event {
            HandshakeEvent::Message(Some(raw)) => {
                if let Some(token) = parse_token_message(&raw) {
                    drop(messages);
                    host.remove_frame(&frame);
                    drop(timeout);

                    tracing::debug!("received token message");
                    return Ok(token);
                }

                tracing::trace!(len = raw.len(), "ignoring message without token");
            }
            HandshakeEvent::Message(None) => {
                host.remove_frame(&frame);
                return Err(AuthError::HandshakeAbandoned);
            }
            HandshakeEvent::TimedOut => {
                tracing::warn!(
                    timeout_secs = HANDSHAKE_TIMEOUT.as_secs(),
                    "no token message received, revealing frame"
                );
                notifier.notify(TIMEOUT_MESSAGE);
                host.reveal_frame(&frame);
            }
        }
    }
}
