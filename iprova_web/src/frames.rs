use std::time::Duration;

use futures::{channel::mpsc, future::LocalBoxFuture, FutureExt};
use gloo_events::EventListener;
use iprova_tokens::host::{FrameHost, FrameName, HostError, MessageSubscription};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, HtmlFormElement, HtmlIFrameElement, HtmlInputElement};

use crate::{js_error, window};

/// Runs redirect handshakes in the current document
///
/// Frames and forms are appended to the document body and identified by their names.
#[derive(Clone, Debug)]
pub struct DomFrameHost {
    window: web_sys::Window,
    document: Document,
}

impl DomFrameHost {
    /// Constructs a host for the current window
    pub fn new() -> Result<Self, HostError> {
        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| HostError::new("window has no document"))?;

        Ok(Self { window, document })
    }

    fn body(&self) -> Result<HtmlElement, HostError> {
        self.document
            .body()
            .ok_or_else(|| HostError::new("document has no body"))
    }

    fn create<T: JsCast>(&self, tag: &str) -> Result<T, HostError> {
        self.document
            .create_element(tag)
            .map_err(|e| js_error("unable to create element", e))?
            .dyn_into::<T>()
            .map_err(|_| HostError::new(format!("<{}> has an unexpected type", tag)))
    }

    fn frame(&self, frame: &FrameName) -> Result<HtmlIFrameElement, HostError> {
        self.document
            .get_element_by_id(frame.as_str())
            .ok_or_else(|| HostError::new(format!("frame {} not found", frame)))?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| HostError::new(format!("{} is not a frame", frame)))
    }

    fn append(&self, element: &HtmlElement) -> Result<(), HostError> {
        self.body()?
            .append_child(element)
            .map_err(|e| js_error("unable to attach element", e))?;
        Ok(())
    }

    fn show(&self, frame: &FrameName) -> Result<(), HostError> {
        let style = self.frame(frame)?.style();
        for (property, value) in [("display", "block"), ("width", "100%"), ("height", "600px")] {
            style
                .set_property(property, value)
                .map_err(|e| js_error("unable to style frame", e))?;
        }
        Ok(())
    }
}

fn hide(element: &HtmlElement) -> Result<(), HostError> {
    element
        .style()
        .set_property("display", "none")
        .map_err(|e| js_error("unable to hide element", e))
}

fn timeout_millis(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

impl FrameHost for DomFrameHost {
    fn create_hidden_frame(&self, frame: &FrameName) -> Result<(), HostError> {
        let iframe: HtmlIFrameElement = self.create("iframe")?;
        iframe.set_name(frame.as_str());
        iframe.set_id(frame.as_str());
        hide(&iframe)?;
        self.append(&iframe)
    }

    fn navigate_frame(&self, frame: &FrameName, url: &str) -> Result<(), HostError> {
        self.frame(frame)?.set_src(url);
        Ok(())
    }

    fn post_to_frame(
        &self,
        frame: &FrameName,
        action: &str,
        field: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let form: HtmlFormElement = self.create("form")?;
        form.set_id(&frame.form_id());
        form.set_method("post");
        form.set_action(action);
        form.set_target(frame.as_str());
        hide(&form)?;

        let input: HtmlInputElement = self.create("input")?;
        input.set_type("hidden");
        input.set_name(field);
        input.set_value(value);
        form.append_child(&input)
            .map_err(|e| js_error("unable to attach form field", e))?;

        self.append(&form)?;
        form.submit().map_err(|e| js_error("unable to submit form", e))
    }

    fn subscribe_messages(&self) -> Result<MessageSubscription, HostError> {
        let (tx, rx) = mpsc::unbounded();

        let listener = EventListener::new(&self.window, "message", move |event| {
            let data = event
                .dyn_ref::<web_sys::MessageEvent>()
                .and_then(|m| m.data().as_string());

            match data {
                Some(data) => {
                    let _ = tx.unbounded_send(data);
                }
                None => tracing::trace!("ignoring message without string data"),
            }
        });

        Ok(MessageSubscription::new(rx, listener))
    }

    fn reveal_frame(&self, frame: &FrameName) {
        if let Err(error) = self.show(frame) {
            tracing::warn!(%error, %frame, "unable to reveal frame");
        }
    }

    fn remove_frame(&self, frame: &FrameName) {
        for id in [frame.as_str().to_owned(), frame.form_id()] {
            if let Some(element) = self.document.get_element_by_id(&id) {
                element.remove();
            }
        }
    }

    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let window = self.window.clone();
        let millis = timeout_millis(duration);

        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Err(error) =
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
            {
                tracing::warn!(?error, "unable to schedule timeout");
            }
        });

        JsFuture::from(promise).map(|_| ()).boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_clamped_to_the_timer_range() {
        assert_eq!(timeout_millis(Duration::from_secs(30)), 30_000);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), i32::MAX);
    }
}
