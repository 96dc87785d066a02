//! RPC-style calls to the legacy web service endpoints

use http::Method;
use iprova_tokens::{CredentialsMode, LogonMethod, Token, TransportRequest};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{client::parse_body, CallError, ConfigError, IProvaClient};

/// The parameter carrying the caller's credentials
pub const CREDENTIALS_PARAMETER: &str = "objCredentials";

/// A call to a function of a legacy web service endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct RpcCall {
    endpoint: String,
    function: String,
    parameters: Map<String, Value>,
}

impl RpcCall {
    /// A call to `function` on `endpoint` without parameters
    pub fn new(endpoint: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            function: function.into(),
            parameters: Map::new(),
        }
    }

    /// Adds a named parameter
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replaces all parameters
    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Whether the caller supplied credentials of its own
    #[inline]
    pub fn has_credentials(&self) -> bool {
        self.parameters.contains_key(CREDENTIALS_PARAMETER)
    }

    fn url_path(&self) -> String {
        format!("{}/web/{}", self.endpoint, self.function)
    }
}

/// The credentials object understood by the legacy endpoints
enum Credentials<'a> {
    Anonymous,
    Token(&'a Token),
}

impl Serialize for Credentials<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        match self {
            Credentials::Anonymous => {
                let mut ser = serializer.serialize_struct("Credentials", 1)?;
                ser.serialize_field("Type", &3)?;
                ser.end()
            }
            Credentials::Token(token) => {
                let mut ser = serializer.serialize_struct("Credentials", 2)?;
                ser.serialize_field("Type", &1)?;
                ser.serialize_field("TokenID", token.as_str())?;
                ser.end()
            }
        }
    }
}

impl IProvaClient {
    /// Calls a legacy web service function
    ///
    /// Equivalent to [`call_rpc_with`][Self::call_rpc_with] without forcing a new token.
    pub async fn call_rpc(&self, call: &RpcCall) -> Result<Value, CallError> {
        self.call_rpc_with(call, false).await
    }

    /// Calls a legacy web service function, optionally forcing a new token
    ///
    /// The credentials parameter is filled in unless the caller supplied one. Cookie
    /// authentication cannot be used with these endpoints and fails before any request
    /// is sent.
    pub async fn call_rpc_with(
        &self,
        call: &RpcCall,
        force_new_token: bool,
    ) -> Result<Value, CallError> {
        if self.config().logon_method() == LogonMethod::Cookie {
            return Err(ConfigError::CookieRpcUnsupported.into());
        }

        self.invoke(force_new_token, move |force_refresh| {
            self.rpc_attempt(call, force_refresh)
        })
        .await
    }

    /// Calls a legacy web service function and deserializes the result
    pub async fn call_rpc_as<T: DeserializeOwned>(&self, call: &RpcCall) -> Result<T, CallError> {
        let value = self.call_rpc(call).await?;
        serde_json::from_value(value).map_err(CallError::Deserialize)
    }

    #[tracing::instrument(
        err,
        skip_all,
        fields(endpoint = %call.endpoint, function = %call.function)
    )]
    async fn rpc_attempt(&self, call: &RpcCall, force_refresh: bool) -> Result<Value, CallError> {
        let mut parameters = call.parameters.clone();

        if !call.has_credentials() {
            let credentials = match self.config().logon_method() {
                LogonMethod::None => serde_json::to_value(Credentials::Anonymous),
                _ => {
                    let token = self.token(force_refresh).await?;
                    serde_json::to_value(Credentials::Token(&token))
                }
            }
            .map_err(CallError::Serialize)?;

            parameters.insert(CREDENTIALS_PARAMETER.to_owned(), credentials);
        }

        let body = serde_json::to_string(&parameters).map_err(CallError::Serialize)?;

        let request = TransportRequest {
            method: Method::POST,
            body: Some(body),
            ..TransportRequest::get(
                self.config().base_url().join(&call.url_path()),
                "application/json",
                CredentialsMode::Omit,
            )
        };

        let raw = self.transport().send(request).await?;
        parse_body(&raw)
    }
}
