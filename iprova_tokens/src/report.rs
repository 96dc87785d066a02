//! Surfacing failures to the user

use crate::TransportFailure;

/// The placeholder replaced by the failure's status text
pub const STATUS_PLACEHOLDER: &str = "@@textStatus@@";

/// Message template for failed API calls
pub const API_CALL_TEMPLATE: &str = "@@textStatus@@ during API Call.";

/// Message template for failed token requests
pub const TOKEN_REQUEST_TEMPLATE: &str = "@@textStatus@@ while getting token.";

/// Message template used when no other template applies
pub const DEFAULT_TEMPLATE: &str = "@@textStatus@@ in ajax request.";

/// Presents blocking notifications to the user
pub trait Notifier {
    /// Shows `message` to the user
    fn notify(&self, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for std::rc::Rc<T> {
    #[inline]
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}

/// A notifier that only logs
///
/// Suitable where there is no user to alert, such as services and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(%message, "user notification");
    }
}

/// Notifies the user of a failed request and records a diagnostic entry
///
/// The entry carries the message and, in its `detail` field, the error body's text or
/// message, falling back to the error raised by the transport.
pub fn report_failure(notifier: &dyn Notifier, failure: &TransportFailure, template: &str) {
    let message = template.replacen(STATUS_PLACEHOLDER, &failure.status_text, 1);
    notifier.notify(&message);

    let detail = failure
        .body
        .as_ref()
        .and_then(|b| b.detail())
        .unwrap_or(&failure.error_thrown);

    if detail.is_empty() {
        tracing::warn!(status = ?failure.status, "{}", message);
    } else {
        tracing::warn!(status = ?failure.status, %detail, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::testing::RecordingNotifier;

    #[test]
    fn substitutes_status_text_into_template() {
        let notifier = RecordingNotifier::default();
        let failure = TransportFailure::network("timeout", "");

        report_failure(&notifier, &failure, API_CALL_TEMPLATE);

        assert_eq!(notifier.messages(), ["timeout during API Call."]);
    }

    #[test]
    fn uses_default_template() {
        let notifier = RecordingNotifier::default();
        let failure = TransportFailure::from_status(404, "Not Found", "");

        report_failure(&notifier, &failure, DEFAULT_TEMPLATE);

        assert_eq!(notifier.messages(), ["error in ajax request."]);
    }

    #[test]
    #[traced_test]
    fn logs_the_error_body_text() {
        let notifier = RecordingNotifier::default();
        let failure = TransportFailure::from_status(
            500,
            "Internal Server Error",
            r#"{"ErrorCode":42,"Message":"Generic failure","Text":"Document not found"}"#,
        );

        report_failure(&notifier, &failure, API_CALL_TEMPLATE);

        assert_eq!(notifier.messages(), ["error during API Call."]);
        assert!(logs_contain(r#"detail=Document not found"#));
        assert!(!logs_contain("Generic failure"));
    }

    #[test]
    #[traced_test]
    fn falls_back_to_the_thrown_error() {
        let notifier = RecordingNotifier::default();
        let failure = TransportFailure::network("error", "connection refused");

        report_failure(&notifier, &failure, TOKEN_REQUEST_TEMPLATE);

        assert_eq!(notifier.messages(), ["error while getting token."]);
        assert!(logs_contain("error while getting token."));
        assert!(logs_contain("detail=connection refused"));
    }
}
