use iprova_tokens::{sources::AuthError, TransportFailure};
use thiserror::Error;

use crate::ConfigError;

/// An error while calling an iProva API
#[derive(Debug, Error)]
pub enum CallError {
    /// The client configuration does not allow the call
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No token could be obtained for the call
    #[error("unable to obtain a token for the call")]
    Auth(#[from] AuthError),
    /// The call failed
    #[error("API call failed")]
    Transport(#[from] TransportFailure),
    /// The call parameters could not be serialized
    #[error("unable to serialize call parameters")]
    Serialize(#[source] serde_json::Error),
    /// The call result did not have the expected shape
    #[error("unable to deserialize call result")]
    Deserialize(#[source] serde_json::Error),
    /// A header value contained characters that cannot be sent
    #[error("invalid header value")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

impl CallError {
    /// The transport failure behind this error, if any
    pub fn transport_failure(&self) -> Option<&TransportFailure> {
        match self {
            CallError::Transport(failure) => Some(failure),
            CallError::Auth(AuthError::Transport(failure)) => Some(failure),
            _ => None,
        }
    }
}
