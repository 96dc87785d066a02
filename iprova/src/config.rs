//! Client configuration

use iprova_tokens::{ApiKey, ApiKeyRef, BaseUrl, InvalidBaseUrl, LogonMethod};
use serde::Deserialize;
use thiserror::Error;

/// An invalid client configuration or an unsupported use of it
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Windows authentication was selected without an API key
    #[error("when using WindowsAuthentication an api key must be used")]
    MissingApiKey,
    /// A SAML logon method was selected without a frame host to run the handshake in
    #[error("logon method {0} requires a frame host")]
    MissingFrameHost(LogonMethod),
    /// An RPC-style call was attempted with cookie authentication
    #[error("cookie authentication is not supported for RPC-style calls")]
    CookieRpcUnsupported,
    /// The base URL is not an absolute URL
    #[error(transparent)]
    InvalidBaseUrl(#[from] InvalidBaseUrl),
}

/// Immutable settings of an iProva client
#[derive(Clone, Debug, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct ClientConfig {
    base_url: BaseUrl,
    logon_method: LogonMethod,
    always_new_token: bool,
    api_version: Option<String>,
    api_key: Option<ApiKey>,
}

impl ClientConfig {
    /// Starts building a configuration for the iProva installation at `base_url`
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: base_url.into(),
            logon_method: LogonMethod::None,
            always_new_token: false,
            api_version: None,
            api_key: None,
        }
    }

    /// The normalized base URL
    #[inline]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// The logon method
    #[inline]
    pub fn logon_method(&self) -> LogonMethod {
        self.logon_method
    }

    /// Whether every call obtains a new token
    #[inline]
    pub fn always_new_token(&self) -> bool {
        self.always_new_token
    }

    /// The API version sent with REST-style calls
    #[inline]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// The API key sent with REST-style calls
    #[inline]
    pub fn api_key(&self) -> Option<&ApiKeyRef> {
        self.api_key.as_deref()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug)]
pub struct ClientConfigBuilder {
    base_url: String,
    logon_method: LogonMethod,
    always_new_token: bool,
    api_version: Option<String>,
    api_key: Option<ApiKey>,
}

impl ClientConfigBuilder {
    /// Sets the logon method, [`LogonMethod::None`] by default
    pub fn logon_method(mut self, logon_method: LogonMethod) -> Self {
        self.logon_method = logon_method;
        self
    }

    /// Obtains a new token for every call instead of reusing the cached one
    pub fn always_new_token(mut self, always_new_token: bool) -> Self {
        self.always_new_token = always_new_token;
        self
    }

    /// Sets the `x-api-version` header value
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets the `x-api_key` header value
    pub fn api_key(mut self, api_key: impl Into<ApiKey>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Validates the settings
    ///
    /// An empty API key or API version counts as not set.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let api_key = self.api_key.filter(|k| !k.as_str().is_empty());
        let api_version = self.api_version.filter(|v| !v.is_empty());

        if self.logon_method == LogonMethod::WindowsAuthentication && api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(ClientConfig {
            base_url: BaseUrl::parse(&self.base_url)?,
            logon_method: self.logon_method,
            always_new_token: self.always_new_token,
            api_version,
            api_key,
        })
    }
}

/// The configuration object as accepted by the browser client
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(rename = "iProvaUrl")]
    iprova_url: String,
    #[serde(default = "default_logon_method")]
    logon_method: LogonMethod,
    #[serde(default)]
    always_get_new_user_token: bool,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    api_key: Option<ApiKey>,
}

fn default_logon_method() -> LogonMethod {
    LogonMethod::None
}

impl TryFrom<RawConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        ClientConfigBuilder {
            base_url: raw.iprova_url,
            logon_method: raw.logon_method,
            always_new_token: raw.always_get_new_user_token,
            api_version: raw.version,
            api_key: raw.api_key,
        }
        .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_a_trailing_separator() {
        let config = ClientConfig::builder("https://iprova.example.com/iprova")
            .build()
            .unwrap();

        assert_eq!(config.base_url().as_str(), "https://iprova.example.com/iprova/");
        assert_eq!(config.logon_method(), LogonMethod::None);
        assert!(!config.always_new_token());
    }

    #[test]
    fn windows_authentication_requires_an_api_key() {
        let err = ClientConfig::builder("https://iprova.example.com/")
            .logon_method(LogonMethod::WindowsAuthentication)
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn windows_authentication_with_api_key_is_valid() {
        let config = ClientConfig::builder("https://iprova.example.com/")
            .logon_method(LogonMethod::WindowsAuthentication)
            .api_key(ApiKey::from_static("key"))
            .build()
            .unwrap();

        assert_eq!(config.api_key().map(|k| k.as_str()), Some("key"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let err = ClientConfig::builder("https://iprova.example.com/")
            .logon_method(LogonMethod::WindowsAuthentication)
            .api_key(ApiKey::from_static(""))
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn empty_api_key_and_version_are_dropped() {
        let config = ClientConfig::builder("https://iprova.example.com/")
            .api_key(ApiKey::from_static(""))
            .api_version("")
            .build()
            .unwrap();

        assert!(config.api_key().is_none());
        assert!(config.api_version().is_none());
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ClientConfig::builder("iprova").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    mod when_deserializing {
        use super::*;

        #[test]
        fn accepts_the_browser_client_options() {
            let config: ClientConfig = serde_json::from_str(
                r#"{
                    "iProvaUrl": "https://iprova.example.com/iprova",
                    "logonMethod": 4,
                    "alwaysGetNewUserToken": true,
                    "version": "5",
                    "apiKey": "abc"
                }"#,
            )
            .unwrap();

            assert_eq!(config.logon_method(), LogonMethod::Saml2);
            assert!(config.always_new_token());
            assert_eq!(config.api_version(), Some("5"));
            assert_eq!(config.api_key().map(|k| k.as_str()), Some("abc"));
        }

        #[test]
        fn defaults_to_anonymous_access() {
            let config: ClientConfig =
                serde_json::from_str(r#"{"iProvaUrl":"https://iprova.example.com/"}"#).unwrap();

            assert_eq!(config.logon_method(), LogonMethod::None);
            assert!(config.api_key().is_none());
        }

        #[test]
        fn validates_like_the_builder() {
            let result = serde_json::from_str::<ClientConfig>(
                r#"{"iProvaUrl":"https://iprova.example.com/","logonMethod":"WindowsAuthentication","apiKey":""}"#,
            );

            let message = result.unwrap_err().to_string();
            assert!(message.contains("api key"), "{}", message);
        }
    }
}
