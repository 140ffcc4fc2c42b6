//! Domain trigger events.
//!
//! An event is an immutable fact produced by the surrounding subsystems
//! (members, donations, events, attendance) and consumed only by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::TriggerType;

/// An immutable description of something that happened in the domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Event type, matched against workflow trigger types.
    #[serde(rename = "type")]
    pub trigger: TriggerType,

    /// Event payload. Conditions and action configs resolve dotted paths
    /// into this value.
    #[serde(default)]
    pub payload: serde_json::Value,

    /// When the event occurred.
    #[serde(default = "Utc::now")]
    pub occurred_at: DateTime<Utc>,

    /// Natural idempotency key, when the producer has one (e.g. a payment
    /// reference). Absent key means at-least-once triggering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl TriggerEvent {
    /// Create an event occurring now.
    pub fn new(trigger: TriggerType, payload: serde_json::Value) -> Self {
        Self {
            trigger,
            payload,
            occurred_at: Utc::now(),
            idempotency_key: None,
        }
    }

    /// Attach an idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserialization() {
        let json = serde_json::json!({
            "type": "donation_received",
            "payload": {"amount": 500, "member_id": "m-1"},
            "idempotency_key": "pay-abc"
        });

        let event: TriggerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.trigger, TriggerType::DonationReceived);
        assert_eq!(event.payload["amount"], 500);
        assert_eq!(event.idempotency_key.as_deref(), Some("pay-abc"));
    }

    #[test]
    fn test_event_defaults() {
        let json = serde_json::json!({"type": "member_created"});
        let event: TriggerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.trigger, TriggerType::MemberCreated);
        assert!(event.payload.is_null());
        assert!(event.idempotency_key.is_none());
    }
}
