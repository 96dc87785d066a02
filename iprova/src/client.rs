use std::{fmt, future::Future, rc::Rc};

use iprova_tokens::{
    host::FrameHost,
    report::{report_failure, Notifier, TracingNotifier, API_CALL_TEMPLATE},
    sources::AuthFlowExecutor,
    FrameIdGenerator, Token, TokenCache, Transport, TransportFailure,
};
use serde_json::Value;

use crate::{CallError, ClientConfig, ConfigError};

/// A client for one iProva installation
///
/// The client caches the token of its logon method and attaches it to the calls that
/// need it. Calls rejected because the token expired are retried once with a new token.
pub struct IProvaClient {
    config: ClientConfig,
    transport: Rc<dyn Transport>,
    notifier: Rc<dyn Notifier>,
    tokens: TokenCache,
}

impl IProvaClient {
    /// Starts building a client that sends its requests through `transport`
    pub fn builder(config: ClientConfig, transport: impl Transport + 'static) -> ClientBuilder {
        ClientBuilder {
            config,
            transport: Rc::new(transport),
            notifier: Rc::new(TracingNotifier),
            host: None,
            frame_ids: FrameIdGenerator::default(),
        }
    }

    /// The client configuration
    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token currently cached, if any
    pub fn cached_token(&self) -> Option<Token> {
        self.tokens.cached()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    pub(crate) async fn token(&self, force_refresh: bool) -> Result<Token, CallError> {
        Ok(self.tokens.get_token(force_refresh).await?)
    }

    /// Runs `attempt`, retrying once with a forced token refresh if the token expired
    ///
    /// `attempt` receives whether it must force a token refresh. Final transport failures
    /// are reported to the user.
    pub(crate) async fn invoke<T, F, Fut>(
        &self,
        force_new_token: bool,
        attempt: F,
    ) -> Result<T, CallError>
    where
        F: Fn(bool) -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let force_refresh = force_new_token || self.config.always_new_token();

        let result = match attempt(force_refresh).await {
            Err(CallError::Transport(failure)) if failure.is_token_expired() => {
                tracing::debug!("token expired, retrying call with a new token");
                attempt(true).await
            }
            other => other,
        };

        if let Err(CallError::Transport(failure)) = &result {
            self.report(failure);
        }

        result
    }

    fn report(&self, failure: &TransportFailure) {
        report_failure(&*self.notifier, failure, API_CALL_TEMPLATE);
    }
}

/// Parses a successful response body
///
/// Empty bodies become `null`; anything else must be JSON.
pub(crate) fn parse_body(raw: &str) -> Result<Value, CallError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(raw).map_err(|e| CallError::Transport(TransportFailure::parser_error(&e)))
}

impl fmt::Debug for IProvaClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IProvaClient")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .finish()
    }
}

/// Builder for [`IProvaClient`]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Rc<dyn Transport>,
    notifier: Rc<dyn Notifier>,
    host: Option<Rc<dyn FrameHost>>,
    frame_ids: FrameIdGenerator,
}

impl ClientBuilder {
    /// Sets the notifier used to alert the user, which only logs by default
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Rc::new(notifier);
        self
    }

    /// Sets the frame host that runs SAML redirect handshakes
    pub fn frame_host(mut self, host: impl FrameHost + 'static) -> Self {
        self.host = Some(Rc::new(host));
        self
    }

    /// Sets the generator naming handshake frames
    pub fn frame_ids(mut self, frame_ids: FrameIdGenerator) -> Self {
        self.frame_ids = frame_ids;
        self
    }

    /// Builds the client
    ///
    /// SAML logon methods need a frame host.
    pub fn build(self) -> Result<IProvaClient, ConfigError> {
        let logon_method = self.config.logon_method();

        let mut executor = AuthFlowExecutor::new(
            self.config.base_url().clone(),
            logon_method,
            self.transport.clone(),
            self.notifier.clone(),
        )
        .with_frame_ids(self.frame_ids);

        match self.host {
            Some(host) => executor = executor.with_frame_host(host),
            None if logon_method.is_saml() => {
                return Err(ConfigError::MissingFrameHost(logon_method))
            }
            None => {}
        }

        Ok(IProvaClient {
            config: self.config,
            transport: self.transport,
            notifier: self.notifier,
            tokens: TokenCache::new(executor),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("has_frame_host", &self.host.is_some())
            .field("frame_ids", &self.frame_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use iprova_tokens::{testing::ScriptedTransport, ApiKey, LogonMethod};

    use super::*;

    #[test]
    fn saml_methods_require_a_frame_host() {
        for method in [LogonMethod::Adfs, LogonMethod::Saml2, LogonMethod::Saml] {
            let config = ClientConfig::builder("https://iprova.example.com/")
                .logon_method(method)
                .build()
                .unwrap();

            let err = IProvaClient::builder(config, ScriptedTransport::new())
                .build()
                .unwrap_err();

            assert!(matches!(err, ConfigError::MissingFrameHost(m) if m == method));
        }
    }

    #[test]
    fn windows_authentication_needs_no_frame_host() {
        let config = ClientConfig::builder("https://iprova.example.com/")
            .logon_method(LogonMethod::WindowsAuthentication)
            .api_key(ApiKey::from_static("key"))
            .build()
            .unwrap();

        let client = IProvaClient::builder(config, ScriptedTransport::new())
            .build()
            .unwrap();

        assert!(client.cached_token().is_none());
    }

    #[test]
    fn empty_bodies_parse_as_null() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn unparseable_bodies_are_parser_errors() {
        let err = parse_body("<html>").unwrap_err();
        let failure = err.transport_failure().unwrap();
        assert_eq!(failure.status_text, "parsererror");
    }
}
