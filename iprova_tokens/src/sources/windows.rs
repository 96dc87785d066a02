//! Tokens for users signed in through Windows integrated authentication

use crate::{
    report::{report_failure, Notifier, TOKEN_REQUEST_TEMPLATE},
    sources::AuthError,
    transport::{CredentialsMode, TransportRequest},
    BaseUrl, Token, Transport,
};

/// Path of the token endpoint, relative to the base URL
pub const TOKEN_PATH: &str = "management/login/GetWinAuthToken.ashx";

/// The body returned instead of a token when the user is not authenticated
const REJECTED: &str = "0";

/// Requests a token for the Windows user of the browser session
#[tracing::instrument(err, skip_all, fields(base_url = %base_url))]
pub async fn request_token(
    transport: &dyn Transport,
    notifier: &dyn Notifier,
    base_url: &BaseUrl,
) -> Result<Token, AuthError> {
    tracing::trace!("requesting windows authentication token");

    let request = TransportRequest::get(
        base_url.join(TOKEN_PATH),
        "text/plain",
        CredentialsMode::Include,
    );

    let body = match transport.send(request).await {
        Ok(body) => body,
        Err(failure) => {
            report_failure(notifier, &failure, TOKEN_REQUEST_TEMPLATE);
            return Err(failure.into());
        }
    };

    if body == REJECTED {
        notifier.notify("Could not authenticate user.");
        return Err(AuthError::Rejected);
    }

    tracing::debug!("received windows authentication token");
    Ok(Token::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNotifier, ScriptedTransport};
    use crate::TransportFailure;

    fn base_url() -> BaseUrl {
        BaseUrl::parse("https://iprova.example.com/").unwrap()
    }

    #[tokio::test]
    async fn includes_credentials_on_the_token_request() {
        let transport = ScriptedTransport::new();
        transport.respond(TOKEN_PATH, Ok("abc".to_owned()));
        let notifier = RecordingNotifier::default();

        let token = request_token(&transport, &notifier, &base_url())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(token.as_str(), "abc");
        assert_eq!(
            requests[0].url,
            "https://iprova.example.com/management/login/GetWinAuthToken.ashx"
        );
        assert_eq!(requests[0].credentials, CredentialsMode::Include);
        assert_eq!(requests[0].method, http::Method::GET);
    }

    #[tokio::test]
    async fn zero_body_means_the_user_was_not_authenticated() {
        let transport = ScriptedTransport::new();
        transport.respond(TOKEN_PATH, Ok("0".to_owned()));
        let notifier = RecordingNotifier::default();

        let err = request_token(&transport, &notifier, &base_url())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Rejected));
        assert_eq!(notifier.messages(), ["Could not authenticate user."]);
    }

    #[tokio::test]
    async fn transport_failures_are_reported_as_token_failures() {
        let transport = ScriptedTransport::new();
        transport.respond(
            TOKEN_PATH,
            Err(TransportFailure::from_status(500, "Internal Server Error", "")),
        );
        let notifier = RecordingNotifier::default();

        let err = request_token(&transport, &notifier, &base_url())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Transport(_)));
        assert_eq!(notifier.messages(), ["error while getting token."]);
    }
}
