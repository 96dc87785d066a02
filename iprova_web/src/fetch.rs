use async_trait::async_trait;
use iprova_tokens::{CredentialsMode, Transport, TransportFailure, TransportRequest};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

/// Sends requests with the browser's `fetch`
///
/// Browser credentials go along only when the request includes them, and then also on
/// cross-origin requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

fn failure(value: JsValue) -> TransportFailure {
    TransportFailure::network("error", format!("{:?}", value))
}

fn credentials(mode: CredentialsMode) -> RequestCredentials {
    match mode {
        CredentialsMode::Include => RequestCredentials::Include,
        CredentialsMode::Omit => RequestCredentials::Omit,
    }
}

fn build(request: &TransportRequest) -> Result<Request, TransportFailure> {
    let headers = Headers::new().map_err(failure)?;
    headers
        .set("Content-Type", request.content_type)
        .map_err(failure)?;

    for (name, value) in &request.headers {
        let value = value
            .to_str()
            .map_err(|e| TransportFailure::network("error", e.to_string()))?;
        headers.set(name.as_str(), value).map_err(failure)?;
    }

    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    init.set_credentials(credentials(request.credentials));
    init.set_headers(&headers);
    if let Some(body) = &request.body {
        init.set_body(&JsValue::from_str(body));
    }

    Request::new_with_str_and_init(&request.url, &init).map_err(failure)
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    #[tracing::instrument(err, skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        let window =
            crate::window().map_err(|e| TransportFailure::network("error", e.to_string()))?;
        let fetch_request = build(&request)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&fetch_request))
            .await
            .map_err(failure)?
            .dyn_into()
            .map_err(failure)?;

        let text = JsFuture::from(response.text().map_err(failure)?)
            .await
            .map_err(failure)?
            .as_string()
            .unwrap_or_default();

        if response.ok() {
            Ok(text)
        } else {
            Err(TransportFailure::from_status(
                response.status(),
                response.status_text(),
                &text,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_modes_map_to_fetch_policies() {
        assert_eq!(
            credentials(CredentialsMode::Include),
            RequestCredentials::Include
        );
        assert_eq!(credentials(CredentialsMode::Omit), RequestCredentials::Omit);
    }
}
