//! The browser seam used by redirect handshakes

use std::{
    any::Any,
    cell::Cell,
    fmt,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use futures::{channel::mpsc, future::LocalBoxFuture, Stream};
use thiserror::Error;

/// The unique name of a handshake frame
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameName(String);

impl FrameName {
    /// The frame name as used in the document
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier of the form posting into this frame
    pub fn form_id(&self) -> String {
        format!("{}_form", self.0)
    }
}

impl fmt::Display for FrameName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out frame names that are unique for the lifetime of the generator
#[derive(Debug, Default)]
pub struct FrameIdGenerator {
    next: Cell<u64>,
}

impl FrameIdGenerator {
    /// Constructs a generator whose first identifier is `first`
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: Cell::new(first),
        }
    }

    /// Produces the next frame name
    pub fn next_name(&self) -> FrameName {
        let id = self.next.get();
        self.next.set(id + 1);
        FrameName(format!("samlFrame{}", id))
    }
}

/// A host operation failed
#[derive(Clone, Debug, Error)]
#[error("browser host error: {message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Constructs a host error with a description
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A registered cross-window message listener
///
/// Yields the string payload of every message posted to the window. Dropping the
/// subscription deregisters the listener.
pub struct MessageSubscription {
    receiver: mpsc::UnboundedReceiver<String>,
    _registration: Box<dyn Any>,
}

impl MessageSubscription {
    /// Wraps the receiving end of a message channel
    ///
    /// `registration` is kept alive for as long as the subscription and should
    /// deregister the underlying listener when dropped.
    pub fn new(receiver: mpsc::UnboundedReceiver<String>, registration: impl Any) -> Self {
        Self {
            receiver,
            _registration: Box::new(registration),
        }
    }
}

impl fmt::Debug for MessageSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSubscription").finish_non_exhaustive()
    }
}

impl Stream for MessageSubscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

/// The document and window operations needed by a redirect handshake
pub trait FrameHost {
    /// Creates a hidden frame named `frame` and attaches it to the document
    fn create_hidden_frame(&self, frame: &FrameName) -> Result<(), HostError>;

    /// Points the frame at `url`
    fn navigate_frame(&self, frame: &FrameName, url: &str) -> Result<(), HostError>;

    /// Attaches a hidden form targeting the frame and submits it
    ///
    /// The form posts to `action` with a single field `field` set to `value`.
    fn post_to_frame(
        &self,
        frame: &FrameName,
        action: &str,
        field: &str,
        value: &str,
    ) -> Result<(), HostError>;

    /// Registers a listener for cross-window messages
    fn subscribe_messages(&self) -> Result<MessageSubscription, HostError>;

    /// Makes a hidden frame visible
    fn reveal_frame(&self, frame: &FrameName);

    /// Removes the frame and any form posting into it from the document
    fn remove_frame(&self, frame: &FrameName);

    /// A future that completes after `duration`
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

impl<T: FrameHost + ?Sized> FrameHost for std::rc::Rc<T> {
    fn create_hidden_frame(&self, frame: &FrameName) -> Result<(), HostError> {
        (**self).create_hidden_frame(frame)
    }

    fn navigate_frame(&self, frame: &FrameName, url: &str) -> Result<(), HostError> {
        (**self).navigate_frame(frame, url)
    }

    fn post_to_frame(
        &self,
        frame: &FrameName,
        action: &str,
        field: &str,
        value: &str,
    ) -> Result<(), HostError> {
        (**self).post_to_frame(frame, action, field, value)
    }

    fn subscribe_messages(&self) -> Result<MessageSubscription, HostError> {
        (**self).subscribe_messages()
    }

    fn reveal_frame(&self, frame: &FrameName) {
        (**self).reveal_frame(frame)
    }

    fn remove_frame(&self, frame: &FrameName) {
        (**self).remove_frame(frame)
    }

    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        (**self).delay(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_start_at_zero_and_increase() {
        let ids = FrameIdGenerator::default();

        assert_eq!(ids.next_name().as_str(), "samlFrame0");
        assert_eq!(ids.next_name().as_str(), "samlFrame1");
    }

    #[test]
    fn generators_are_independent() {
        let first = FrameIdGenerator::starting_at(7);
        let second = FrameIdGenerator::default();

        assert_eq!(first.next_name().as_str(), "samlFrame7");
        assert_eq!(second.next_name().as_str(), "samlFrame0");
        assert_eq!(first.next_name().form_id(), "samlFrame8_form");
    }
}
