use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use vergeerp_core::{OrganizationId, UserId};

/// Wire format version carried by every event.
pub const WIRE_VERSION: &str = "1.0";

/// The kind of entitlement mutation an event announces.
///
/// Registry-level kinds are system-wide and carry the system sentinel as
/// their organization id; the rest are tenant-scoped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ModuleRegistered,
    ModuleUpdated,
    ModuleActivated,
    ModuleDeactivated,
    ModuleAssigned,
    ModuleUnassigned,
    ModulesBulkAssigned,
    ModuleConfigUpdated,
    TemplateApplied,
}

impl EventKind {
    /// Topic the event is published to, named after the action.
    pub fn topic(&self) -> &'static str {
        match self {
            EventKind::ModuleRegistered => "tenant.module.registered",
            EventKind::ModuleUpdated => "tenant.module.updated",
            EventKind::ModuleActivated => "tenant.module.activated",
            EventKind::ModuleDeactivated => "tenant.module.deactivated",
            EventKind::ModuleAssigned => "tenant.module.assigned",
            EventKind::ModuleUnassigned => "tenant.module.unassigned",
            EventKind::ModulesBulkAssigned => "tenant.module.bulk_assigned",
            EventKind::ModuleConfigUpdated => "tenant.module.config_updated",
            EventKind::TemplateApplied => "tenant.module.template_applied",
        }
    }

    /// Parse a topic string back into a kind (consumer side).
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            "tenant.module.registered" => Some(EventKind::ModuleRegistered),
            "tenant.module.updated" => Some(EventKind::ModuleUpdated),
            "tenant.module.activated" => Some(EventKind::ModuleActivated),
            "tenant.module.deactivated" => Some(EventKind::ModuleDeactivated),
            "tenant.module.assigned" => Some(EventKind::ModuleAssigned),
            "tenant.module.unassigned" => Some(EventKind::ModuleUnassigned),
            "tenant.module.bulk_assigned" => Some(EventKind::ModulesBulkAssigned),
            "tenant.module.config_updated" => Some(EventKind::ModuleConfigUpdated),
            "tenant.module.template_applied" => Some(EventKind::TemplateApplied),
            _ => None,
        }
    }
}

/// One entitlement change, as published to the bus.
///
/// Wire format: `{event_id, event_type, timestamp, organization_id,
/// user_id?, payload, version: "1.0"}`. The partition/ordering key is the
/// string form of `organization_id`, so all events for one tenant are
/// observed in emission order by any single consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEvent {
    pub event_id: Uuid,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub organization_id: OrganizationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub payload: JsonValue,
    pub version: String,
}

impl ModuleEvent {
    pub fn new(
        kind: EventKind,
        organization_id: OrganizationId,
        user_id: Option<UserId>,
        payload: JsonValue,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            timestamp,
            organization_id,
            user_id,
            payload,
            version: WIRE_VERSION.to_string(),
        }
    }

    /// Registry-level event, scoped to the system sentinel organization.
    pub fn system(
        kind: EventKind,
        user_id: Option<UserId>,
        payload: JsonValue,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(kind, OrganizationId::system(), user_id, payload, timestamp)
    }

    pub fn topic(&self) -> &'static str {
        self.kind.topic()
    }

    /// Partition/ordering key.
    pub fn partition_key(&self) -> String {
        self.organization_id.to_string()
    }
}
