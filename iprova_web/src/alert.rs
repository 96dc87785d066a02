use iprova_tokens::report::Notifier;

/// Notifies the user with a blocking `window.alert`
#[derive(Clone, Copy, Debug, Default)]
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn notify(&self, message: &str) {
        let shown = crate::window().and_then(|w| {
            w.alert_with_message(message)
                .map_err(|e| crate::js_error("alert failed", e))
        });

        if let Err(error) = shown {
            tracing::warn!(%error, %message, "unable to alert the user");
        }
    }
}
