//! Event dispatchers
//!
//! Publishing is best-effort: the service logs dispatcher failures and never
//! rolls back a saved rumor because an event could not be delivered.

use rumormill_domain::{EventDispatcher, RumorEvent};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Errors from the bundled dispatchers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Receiving side has gone away
    #[error("Event channel closed")]
    Closed,
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    type Error = DispatchError;

    fn publish(&self, _event: &RumorEvent) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Writes every event to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl EventDispatcher for TracingDispatcher {
    type Error = DispatchError;

    fn publish(&self, event: &RumorEvent) -> Result<(), Self::Error> {
        info!(
            kind = event.kind.as_str(),
            rumor_id = %event.rumor_id,
            entity_id = event.entity_id.as_deref().unwrap_or("-"),
            data = ?event.data,
            "Rumor event"
        );
        Ok(())
    }
}

/// Forwards events to an unbounded tokio channel
///
/// Never blocks. Fails only once the receiver has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<RumorEvent>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver its events arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RumorEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventDispatcher for ChannelDispatcher {
    type Error = DispatchError;

    fn publish(&self, event: &RumorEvent) -> Result<(), Self::Error> {
        self.sender.send(event.clone()).map_err(|_| DispatchError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumormill_domain::{RumorEventKind, RumorId};

    fn event() -> RumorEvent {
        RumorEvent::new(RumorEventKind::Created, RumorId::new(), Some("npc_1".to_string()), 1)
    }

    #[test]
    fn test_channel_delivers() {
        let (dispatcher, mut receiver) = ChannelDispatcher::new();
        let sent = event();
        dispatcher.publish(&sent).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), sent);
    }

    #[test]
    fn test_channel_closed() {
        let (dispatcher, receiver) = ChannelDispatcher::new();
        drop(receiver);
        assert_eq!(dispatcher.publish(&event()), Err(DispatchError::Closed));
    }

    #[test]
    fn test_noop_and_tracing_accept_everything() {
        assert!(NoopDispatcher.publish(&event()).is_ok());
        assert!(TracingDispatcher.publish(&event()).is_ok());
    }
}
