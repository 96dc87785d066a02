//! Token sources, one authentication flow per logon method

use std::{fmt, rc::Rc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    host::{FrameHost, FrameIdGenerator, HostError},
    report::Notifier,
    BaseUrl, LogonMethod, Token, Transport, TransportFailure,
};

pub mod saml;
pub mod windows;

/// An asynchronous source of fresh tokens
#[async_trait(?Send)]
pub trait AsyncTokenSource {
    /// Runs an authentication flow to obtain a new token
    async fn request_token(&self) -> Result<Token, AuthError>;
}

/// An error while obtaining a token
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token request itself failed
    #[error("error requesting token from iProva")]
    Transport(#[from] TransportFailure),
    /// iProva answered, but could not authenticate the user
    #[error("iProva could not authenticate the user")]
    Rejected,
    /// The SAML descriptor could not be parsed
    #[error("malformed SAML descriptor")]
    MalformedDescriptor(#[source] serde_json::Error),
    /// A redirect handshake was required, but no frame host was configured
    #[error("no frame host available for the redirect handshake")]
    NoFrameHost,
    /// The frame host failed
    #[error("redirect handshake failed")]
    Host(#[from] HostError),
    /// The message listener was closed before a token arrived
    #[error("message listener closed before a token was received")]
    HandshakeAbandoned,
    /// The logon method does not obtain tokens
    #[error("logon method {0} does not obtain tokens")]
    NoTokenFlow(LogonMethod),
}

/// Runs the authentication flow selected by a logon method
pub struct AuthFlowExecutor {
    base_url: BaseUrl,
    logon_method: LogonMethod,
    transport: Rc<dyn Transport>,
    notifier: Rc<dyn Notifier>,
    host: Option<Rc<dyn FrameHost>>,
    frame_ids: FrameIdGenerator,
}

impl AuthFlowExecutor {
    /// Constructs a new executor
    ///
    /// Redirect handshakes additionally need a frame host, see
    /// [`with_frame_host()`][Self::with_frame_host()].
    pub fn new(
        base_url: BaseUrl,
        logon_method: LogonMethod,
        transport: Rc<dyn Transport>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            base_url,
            logon_method,
            transport,
            notifier,
            host: None,
            frame_ids: FrameIdGenerator::default(),
        }
    }

    /// Sets the frame host used by redirect handshakes
    pub fn with_frame_host(mut self, host: Rc<dyn FrameHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Replaces the generator naming handshake frames
    pub fn with_frame_ids(mut self, frame_ids: FrameIdGenerator) -> Self {
        self.frame_ids = frame_ids;
        self
    }

    /// The logon method this executor authenticates with
    #[inline]
    pub fn logon_method(&self) -> LogonMethod {
        self.logon_method
    }
}

impl fmt::Debug for AuthFlowExecutor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AuthFlowExecutor")
            .field("base_url", &self.base_url)
            .field("logon_method", &self.logon_method)
            .field("has_frame_host", &self.host.is_some())
            .field("frame_ids", &self.frame_ids)
            .finish()
    }
}

#[async_trait(?Send)]
impl AsyncTokenSource for AuthFlowExecutor {
    async fn request_token(&self) -> Result<Token, AuthError> {
        match self.logon_method {
            LogonMethod::WindowsAuthentication => {
                windows::request_token(&*self.transport, &*self.notifier, &self.base_url).await
            }
            LogonMethod::Adfs | LogonMethod::Saml2 | LogonMethod::Saml => {
                let host = self.host.as_deref().ok_or(AuthError::NoFrameHost)?;
                let descriptor = saml::fetch_descriptor(
                    &*self.transport,
                    &*self.notifier,
                    &self.base_url,
                    self.logon_method.saml_variant(),
                )
                .await?;

                saml::run_handshake(
                    host,
                    &*self.notifier,
                    self.frame_ids.next_name(),
                    &descriptor,
                )
                .await
            }
            method @ (LogonMethod::None | LogonMethod::Cookie) => {
                Err(AuthError::NoTokenFlow(method))
            }
        }
    }
}
