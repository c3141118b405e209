//! Redis Streams-backed event bus (durable, at-least-once delivery).
//!
//! Uses XADD/XREADGROUP so events survive process restarts and so multiple
//! consumers in a group share the work. Each event is appended with its
//! topic, partition key and JSON wire payload as stream fields; consumers in
//! the same group each see a message once, consumers in different groups each
//! see every message.
//!
//! ## Architecture
//!
//! - **Stream key**: `vergeerp:module-events` (single stream, all topics)
//! - **Consumer groups**: one per consumer type (e.g. `cache.invalidation`)
//! - **Consumers**: named consumers within groups (e.g. `worker-1`)
//!
//! Messages are acknowledged as soon as they are forwarded to the in-process
//! subscription channel; the invalidation handler is idempotent, so a crash
//! between forward and handle only costs a redundant delete on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use vergeerp_events::{EventBus, ModuleEvent, PublishError, Subscription};

const DEFAULT_STREAM_KEY: &str = "vergeerp:module-events";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RedisStreamsEventBus {
    client: Arc<redis::Client>,
    stream_key: String,
}

impl RedisStreamsEventBus {
    /// Create a bus against the given Redis URL.
    ///
    /// `stream_key` overrides the default stream (`vergeerp:module-events`).
    pub fn new(
        redis_url: impl AsRef<str>,
        stream_key: Option<String>,
    ) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| PublishError::Unavailable(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            stream_key: stream_key.unwrap_or_else(|| DEFAULT_STREAM_KEY.to_string()),
        })
    }

    fn connection(&self) -> Result<redis::Connection, PublishError> {
        self.client
            .get_connection()
            .map_err(|e| PublishError::Unavailable(e.to_string()))
    }

    /// Ensure a consumer group exists (idempotent).
    ///
    /// XGROUP CREATE with MKSTREAM creates the stream if missing. A
    /// BUSYGROUP error means the group already exists and is ignored.
    pub fn ensure_consumer_group(&self, group_name: &str) -> Result<(), PublishError> {
        let mut conn = self.connection()?;
        let _: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(group_name)
            .arg("0")
            .arg("MKSTREAM")
            .query(&mut conn);
        Ok(())
    }

    /// Subscribe with an explicit consumer group (for production use).
    ///
    /// A background thread polls XREADGROUP and forwards wire payloads into
    /// the returned channel-backed [`Subscription`]. The thread exits when
    /// the subscription is dropped.
    pub fn subscribe_with_group(
        &self,
        group_name: &str,
        consumer_name: &str,
    ) -> Subscription<ModuleEvent> {
        if let Err(e) = self.ensure_consumer_group(group_name) {
            error!(group = group_name, error = %e, "failed to create consumer group");
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let bus = self.clone();
        let group = group_name.to_string();
        let consumer = consumer_name.to_string();

        std::thread::spawn(move || {
            loop {
                let batch = match bus.read_group(&group, &consumer, 10, POLL_INTERVAL) {
                    Ok(batch) => batch,
                    Err(e) => {
                        warn!(group = %group, error = %e, "redis stream read failed");
                        std::thread::sleep(POLL_INTERVAL);
                        continue;
                    }
                };

                let mut delivered = Vec::with_capacity(batch.len());
                for (message_id, event) in batch {
                    if tx.send(event).is_err() {
                        return; // Receiver dropped
                    }
                    delivered.push(message_id);
                }

                if let Err(e) = bus.acknowledge(&group, &delivered) {
                    warn!(group = %group, error = %e, "redis XACK failed");
                }
            }
        });

        Subscription::new(rx)
    }

    fn read_group(
        &self,
        group_name: &str,
        consumer_name: &str,
        count: usize,
        block: Duration,
    ) -> Result<Vec<(String, ModuleEvent)>, PublishError> {
        let mut conn = self.connection()?;

        let result: redis::RedisResult<HashMap<String, Vec<redis::Value>>> =
            redis::cmd("XREADGROUP")
                .arg("GROUP")
                .arg(group_name)
                .arg(consumer_name)
                .arg("COUNT")
                .arg(count.to_string())
                .arg("BLOCK")
                .arg(block.as_millis().to_string())
                .arg("STREAMS")
                .arg(&self.stream_key)
                .arg(">")
                .query(&mut conn);

        let stream_data = match result {
            Ok(data) => data,
            // Nil reply means the blocking read timed out with no messages.
            Err(e) if e.kind() == redis::ErrorKind::TypeError => return Ok(vec![]),
            Err(e) => {
                return Err(PublishError::Unavailable(format!("XREADGROUP failed: {e}")));
            }
        };

        let entries = stream_data
            .get(&self.stream_key)
            .cloned()
            .unwrap_or_default();

        let mut messages = Vec::new();
        for entry in entries {
            match parse_stream_entry(entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => warn!(error = %e, "skipping undecodable stream entry"),
            }
        }
        Ok(messages)
    }

    fn acknowledge(&self, group_name: &str, message_ids: &[String]) -> Result<(), PublishError> {
        if message_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;
        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(group_name)
            .arg(message_ids)
            .query(&mut conn)
            .map_err(|e| PublishError::Unavailable(format!("XACK failed: {e}")))?;
        Ok(())
    }
}

/// Entry format: `[message_id, [field1, value1, field2, value2, ...]]`.
fn parse_stream_entry(entry: redis::Value) -> Result<(String, ModuleEvent), PublishError> {
    let entry_vec = match entry {
        redis::Value::Bulk(v) => v,
        _ => return Err(PublishError::Serialization("invalid entry format".to_string())),
    };
    if entry_vec.len() < 2 {
        return Err(PublishError::Serialization("entry too short".to_string()));
    }

    let message_id = match &entry_vec[0] {
        redis::Value::Data(data) => String::from_utf8_lossy(data).to_string(),
        _ => return Err(PublishError::Serialization("invalid message id".to_string())),
    };

    let fields_vec = match &entry_vec[1] {
        redis::Value::Bulk(v) => v,
        _ => return Err(PublishError::Serialization("invalid fields format".to_string())),
    };

    let mut payload = None;
    for chunk in fields_vec.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = chunk {
            if key.as_slice() == b"payload" {
                payload = Some(String::from_utf8_lossy(value).to_string());
            }
        }
    }

    let payload =
        payload.ok_or_else(|| PublishError::Serialization("missing payload field".to_string()))?;
    let event: ModuleEvent = serde_json::from_str(&payload)
        .map_err(|e| PublishError::Serialization(format!("undecodable event payload: {e}")))?;

    Ok((message_id, event))
}

impl EventBus<ModuleEvent> for RedisStreamsEventBus {
    fn publish(&self, message: ModuleEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&message)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let mut conn = self.connection()?;

        // XADD with auto-generated ID. The partition key rides along as a
        // field so group consumers can shard by organization.
        let _: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("*")
            .arg("topic")
            .arg(message.topic())
            .arg("partition_key")
            .arg(message.partition_key())
            .arg("payload")
            .arg(&payload)
            .query(&mut conn)
            .map_err(|e| PublishError::Unavailable(format!("XADD failed: {e}")))?;

        Ok(())
    }

    fn subscribe(&self) -> Subscription<ModuleEvent> {
        // Each anonymous subscription gets its own group, so it observes the
        // full stream (broadcast semantics, matching the in-memory bus).
        let group = format!("sub-{}", uuid::Uuid::now_v7());
        let consumer = format!("consumer-{}", uuid::Uuid::now_v7());
        self.subscribe_with_group(&group, &consumer)
    }
}
