//! Test doubles for the transport, host, and notifier seams

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    time::Duration,
};

use async_trait::async_trait;
use futures::{channel::mpsc, future::LocalBoxFuture, FutureExt};

use crate::{
    host::{FrameHost, FrameName, HostError, MessageSubscription},
    report::Notifier,
    Transport, TransportFailure, TransportRequest,
};

type Response = Result<String, TransportFailure>;

/// A transport answering from per-route scripts
///
/// Responses are matched by URL suffix. Each route replays its responses in order
/// and keeps repeating the last one. Unscripted routes answer `404 Not Found`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: RefCell<Vec<(String, VecDeque<Response>)>>,
    requests: RefCell<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Constructs a transport with no scripted routes
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for requests whose URL ends with `suffix`
    pub fn respond(&self, suffix: &str, response: Response) {
        let mut routes = self.routes.borrow_mut();
        match routes.iter_mut().find(|(s, _)| s == suffix) {
            Some((_, queue)) => queue.push_back(response),
            None => routes.push((suffix.to_owned(), VecDeque::from([response]))),
        }
    }

    /// Every request sent so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.borrow().clone()
    }

    /// The URLs of every request sent so far
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }

    /// The number of requests whose URL ends with `suffix`
    pub fn count(&self, suffix: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }

    fn answer(&self, url: &str) -> Response {
        let mut routes = self.routes.borrow_mut();
        let queue = routes
            .iter_mut()
            .filter(|(suffix, _)| url.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, queue)| queue);

        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(not_found),
            Some(queue) => queue.front().cloned().unwrap_or_else(not_found),
            None => not_found(),
        }
    }
}

fn not_found() -> Response {
    Err(TransportFailure::from_status(404, "Not Found", ""))
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<String, TransportFailure> {
        let response = self.answer(&request.url);
        self.requests.borrow_mut().push(request);
        response
    }
}

/// A change a [`RecordingHost`] made to its pretend document
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEvent {
    /// A hidden frame was attached
    Created(String),
    /// A frame was pointed at a URL
    Navigated {
        /// The frame name
        frame: String,
        /// The frame source
        url: String,
    },
    /// A form was submitted into a frame
    FormPosted {
        /// The frame name
        frame: String,
        /// The form action
        action: String,
        /// The field name
        field: String,
        /// The field value
        value: String,
    },
    /// A frame was made visible
    Revealed(String),
    /// A frame and its form were removed
    Removed(String),
}

/// A frame host that records document changes and simulates the identity provider
///
/// When a frame is loaded, the configured replies are posted to every registered
/// listener, in order. Delays are real `tokio` timers, so tests can pause time.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: RefCell<Vec<FrameEvent>>,
    listeners: RefCell<Vec<mpsc::UnboundedSender<String>>>,
    replies: Vec<String>,
    close_on_load: Cell<bool>,
}

impl RecordingHost {
    /// Constructs a host that posts no replies
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts `replies` to the listeners whenever a frame is loaded
    pub fn reply_on_load<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        self
    }

    /// Closes every listener when the next frame is loaded
    pub fn close_listeners_on_load(&self) {
        self.close_on_load.set(true);
    }

    /// Posts a cross-window message to every registered listener
    pub fn post_message(&self, data: &str) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|l| !l.is_closed());
        for listener in listeners.iter() {
            let _ = listener.unbounded_send(data.to_owned());
        }
    }

    /// The number of listeners still registered
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| !l.is_closed())
            .count()
    }

    /// Every document change so far
    pub fn events(&self) -> Vec<FrameEvent> {
        self.events.borrow().clone()
    }

    fn loaded(&self) {
        if self.close_on_load.get() {
            self.listeners.borrow_mut().clear();
            return;
        }

        for reply in &self.replies {
            self.post_message(reply);
        }
    }
}

impl FrameHost for RecordingHost {
    fn create_hidden_frame(&self, frame: &FrameName) -> Result<(), HostError> {
        self.events
            .borrow_mut()
            .push(FrameEvent::Created(frame.to_string()));
        Ok(())
    }

    fn navigate_frame(&self, frame: &FrameName, url: &str) -> Result<(), HostError> {
        self.events.borrow_mut().push(FrameEvent::Navigated {
            frame: frame.to_string(),
            url: url.to_owned(),
        });
        self.loaded();
        Ok(())
    }

    fn post_to_frame(
        &self,
        frame: &FrameName,
        action: &str,
        field: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.events.borrow_mut().push(FrameEvent::FormPosted {
            frame: frame.to_string(),
            action: action.to_owned(),
            field: field.to_owned(),
            value: value.to_owned(),
        });
        self.loaded();
        Ok(())
    }

    fn subscribe_messages(&self) -> Result<MessageSubscription, HostError> {
        let (tx, rx) = mpsc::unbounded();
        self.listeners.borrow_mut().push(tx);
        Ok(MessageSubscription::new(rx, ()))
    }

    fn reveal_frame(&self, frame: &FrameName) {
        self.events
            .borrow_mut()
            .push(FrameEvent::Revealed(frame.to_string()));
    }

    fn remove_frame(&self, frame: &FrameName) {
        self.events
            .borrow_mut()
            .push(FrameEvent::Removed(frame.to_string()));
    }

    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed_local()
    }
}

/// A notifier that remembers every message
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    /// Every message shown so far
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_owned());
    }
}
