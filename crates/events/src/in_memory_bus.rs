//! In-memory event bus for tests and single-process deployments.

use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};

use crate::bus::{EventBus, PublishError, Subscription};

/// Channel-backed bus: every subscriber receives a clone of every published
/// event, in publish order. Subscribers whose receiving end was dropped are
/// pruned on the next publish.
///
/// There is no persistence and no replay; a subscription only observes events
/// published after it was created. Redis Streams provide the durable variant
/// in `vergeerp-infra`.
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Number of live subscriptions (test helper).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    fn publish(&self, message: M) -> Result<(), PublishError> {
        let mut subscribers = self
            .subscribers
            .lock()
            .map_err(|_| PublishError::Unavailable("subscriber list poisoned".to_string()))?;
        // Dropped receivers fail the send; prune them as we go.
        subscribers.retain(|sender| sender.send(message.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (sender, receiver) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(sender);
        }
        Subscription::new(receiver)
    }
}
