//! REST-style calls

use bytes::{BufMut, BytesMut};
use http::{
    header::{self, HeaderName, HeaderValue},
    HeaderMap, Method,
};
use iprova_tokens::{CredentialsMode, LogonMethod, TokenRef, TransportRequest};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{client::parse_body, CallError, IProvaClient};

/// Header carrying the requested API version
pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-api-version");

/// Header carrying the API key
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api_key");

/// A call to a REST endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct RestCall {
    method: Method,
    path: String,
    parameters: Option<Value>,
}

impl RestCall {
    /// A call without a body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            parameters: None,
        }
    }

    /// A `GET` call
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `POST` call sending `parameters` as its body
    pub fn post(path: impl Into<String>, parameters: Value) -> Self {
        Self::new(Method::POST, path).parameters(parameters)
    }

    /// A `PUT` call sending `parameters` as its body
    pub fn put(path: impl Into<String>, parameters: Value) -> Self {
        Self::new(Method::PUT, path).parameters(parameters)
    }

    /// A `DELETE` call
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets the parameters sent as the JSON body
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

fn authorization_value(token: &TokenRef) -> Result<HeaderValue, CallError> {
    let mut header_value = BytesMut::with_capacity(token.as_str().len() + 6);
    header_value.put_slice(b"token ");
    header_value.put_slice(token.as_str().as_bytes());
    let mut value = HeaderValue::from_maybe_shared(header_value.freeze())?;
    value.set_sensitive(true);
    Ok(value)
}

impl IProvaClient {
    /// Calls a REST endpoint
    ///
    /// Equivalent to [`call_rest_with`][Self::call_rest_with] without forcing a new token.
    pub async fn call_rest(&self, call: &RestCall) -> Result<Value, CallError> {
        self.call_rest_with(call, false).await
    }

    /// Calls a REST endpoint, optionally forcing a new token
    ///
    /// A token is attached only for logon methods that obtain one. An empty response
    /// body yields `null`.
    pub async fn call_rest_with(
        &self,
        call: &RestCall,
        force_new_token: bool,
    ) -> Result<Value, CallError> {
        self.invoke(force_new_token, move |force_refresh| {
            self.rest_attempt(call, force_refresh)
        })
        .await
    }

    /// Calls a REST endpoint and deserializes the result
    pub async fn call_rest_as<T: DeserializeOwned>(&self, call: &RestCall) -> Result<T, CallError> {
        let value = self.call_rest(call).await?;
        serde_json::from_value(value).map_err(CallError::Deserialize)
    }

    #[tracing::instrument(err, skip_all, fields(method = %call.method, path = %call.path))]
    async fn rest_attempt(&self, call: &RestCall, force_refresh: bool) -> Result<Value, CallError> {
        let config = self.config();
        let mut headers = HeaderMap::new();

        if config.logon_method().fetches_token() {
            let token = self.token(force_refresh).await?;
            headers.insert(header::AUTHORIZATION, authorization_value(&token)?);
        }

        if let Some(version) = config.api_version() {
            headers.insert(API_VERSION_HEADER, HeaderValue::from_str(version)?);
        }

        if let Some(api_key) = config.api_key() {
            let mut value = HeaderValue::from_str(api_key.as_str())?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let body = call
            .parameters
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(CallError::Serialize)?;

        let credentials = if config.logon_method() == LogonMethod::Cookie {
            CredentialsMode::Include
        } else {
            CredentialsMode::Omit
        };

        let request = TransportRequest {
            method: call.method.clone(),
            url: config.base_url().join(&call.path),
            headers,
            content_type: "application/json",
            body,
            credentials,
        };

        let raw = self.transport().send(request).await?;
        parse_body(&raw)
    }
}
