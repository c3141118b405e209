//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is the **transport layer** for entitlement change notifications.
//! It is intentionally lightweight and makes minimal assumptions:
//!
//! - **Transport-agnostic**: works with in-memory channels, Redis Streams,
//!   Kafka-style brokers, etc.
//! - **At-least-once delivery**: events may be delivered multiple times;
//!   consumers must be idempotent (cache invalidation is).
//! - **Per-organization ordering**: implementations route by the event's
//!   partition key so a single consumer observes one tenant's events in
//!   emission order. No ordering is guaranteed across organizations.
//! - **Best-effort**: the store write preceding a publish is the source of
//!   truth; publish failures are logged by callers and never rolled back.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use thiserror::Error;

/// Why a publish failed. Callers treat every variant as non-fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The bus backend could not be reached.
    #[error("event bus unavailable: {0}")]
    Unavailable(String),

    /// The publish exceeded its bounded timeout.
    #[error("event bus timeout: {0}")]
    Timeout(String),

    /// The message could not be serialized for the wire.
    #[error("event serialization failed: {0}")]
    Serialization(String),
}

/// A subscription to an event stream.
///
/// Each subscription gets a copy of all events published to the bus
/// (broadcast semantics). Designed for single-threaded consumption; messages
/// arrive in publish order per partition key.
///
/// ```ignore
/// let sub = bus.subscribe();
/// loop {
///     match sub.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => process(event)?,
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish` can fail (bus full, network error); since the preceding store
/// mutation already succeeded, callers log the failure and report the
/// operation as successful anyway. The trait is object safe so services can
/// hold an `Arc<dyn EventBus<M>>` without committing to a transport.
pub trait EventBus<M>: Send + Sync {
    fn publish(&self, message: M) -> Result<(), PublishError>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    fn publish(&self, message: M) -> Result<(), PublishError> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
