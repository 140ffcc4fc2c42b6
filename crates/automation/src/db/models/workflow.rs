//! Workflow definition models.
//!
//! A workflow pairs a trigger (domain event type plus optional payload
//! filter) with an ordered list of actions. Definitions are owned by the
//! workflow service; the engine reads them as a snapshot at execution start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::time::Duration;
use uuid::Uuid;

/// Domain event types a workflow can trigger on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TriggerType {
    /// A member record was created
    MemberCreated,
    /// A member record was updated
    MemberUpdated,
    /// A donation was received
    DonationReceived,
    /// Someone registered for a church event
    EventRegistered,
    /// A member missed expected attendance
    AttendanceMissed,
    /// Operator-defined trigger (birthdays, anniversaries, ...)
    Custom(String),
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TriggerType::MemberCreated => "member_created",
            TriggerType::MemberUpdated => "member_updated",
            TriggerType::DonationReceived => "donation_received",
            TriggerType::EventRegistered => "event_registered",
            TriggerType::AttendanceMissed => "attendance_missed",
            TriggerType::Custom(s) => s,
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for TriggerType {
    fn from(s: &str) -> Self {
        match s {
            "member_created" => TriggerType::MemberCreated,
            "member_updated" => TriggerType::MemberUpdated,
            "donation_received" => TriggerType::DonationReceived,
            "event_registered" => TriggerType::EventRegistered,
            "attendance_missed" => TriggerType::AttendanceMissed,
            other => TriggerType::Custom(other.to_string()),
        }
    }
}

impl Serialize for TriggerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TriggerType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TriggerType::from(s.as_str()))
    }
}

/// Workflow activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Active,
    Paused,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

impl From<&str> for WorkflowStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "active" => Self::Active,
            "paused" => Self::Paused,
            _ => Self::Draft,
        }
    }
}

/// Kinds of side-effecting work an action can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    SendEmail,
    SendSms,
    CreateNotification,
    UpdateRecord,
    /// Webhook-style dispatch with an operator-supplied payload
    Custom,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SendEmail => write!(f, "send_email"),
            Self::SendSms => write!(f, "send_sms"),
            Self::CreateNotification => write!(f, "create_notification"),
            Self::UpdateRecord => write!(f, "update_record"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl From<&str> for ActionKind {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "send_email" => Self::SendEmail,
            "send_sms" => Self::SendSms,
            "create_notification" => Self::CreateNotification,
            "update_record" => Self::UpdateRecord,
            _ => Self::Custom,
        }
    }
}

/// Database workflow record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Workflow {
    /// Primary key.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Trigger type (stored as text, see [`TriggerType`]).
    pub trigger_type: String,

    /// Structured payload filter applied during matching.
    pub trigger_config: Option<serde_json::Value>,

    /// Activation state (stored as text, see [`WorkflowStatus`]).
    pub status: String,

    /// Operator who authored the workflow.
    pub author_id: Option<String>,

    /// When the workflow was created.
    pub created_at: DateTime<Utc>,

    /// When the workflow was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Typed trigger type.
    pub fn trigger(&self) -> TriggerType {
        TriggerType::from(self.trigger_type.as_str())
    }

    /// Typed activation state.
    pub fn state(&self) -> WorkflowStatus {
        WorkflowStatus::from(self.status.as_str())
    }

    /// Whether the workflow participates in matching.
    pub fn is_active(&self) -> bool {
        self.state() == WorkflowStatus::Active
    }
}

/// Database workflow action record.
///
/// `position` is zero-based, dense, and unique within a workflow; it defines
/// the execution sequence.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkflowAction {
    /// Primary key.
    pub id: Uuid,

    /// Owning workflow.
    pub workflow_id: Uuid,

    /// Action kind (stored as text, see [`ActionKind`]).
    pub kind: String,

    /// Zero-based execution order within the workflow.
    pub position: i32,

    /// Kind-specific configuration payload.
    pub config: serde_json::Value,

    /// Optional condition expression gating the action.
    pub condition: Option<serde_json::Value>,

    /// Optional delay before the action runs, relative to the previous
    /// action's completion.
    pub delay_seconds: Option<i64>,
}

impl WorkflowAction {
    /// Typed action kind.
    pub fn action_kind(&self) -> ActionKind {
        ActionKind::from(self.kind.as_str())
    }

    /// Configured delay, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self.delay_seconds {
            Some(secs) if secs > 0 => Some(Duration::from_secs(secs as u64)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_display() {
        assert_eq!(TriggerType::MemberCreated.to_string(), "member_created");
        assert_eq!(
            TriggerType::DonationReceived.to_string(),
            "donation_received"
        );
        assert_eq!(TriggerType::Custom("birthday".into()).to_string(), "birthday");
    }

    #[test]
    fn test_trigger_type_from_str() {
        assert_eq!(
            TriggerType::from("member_created"),
            TriggerType::MemberCreated
        );
        assert_eq!(
            TriggerType::from("attendance_missed"),
            TriggerType::AttendanceMissed
        );
        assert_eq!(
            TriggerType::from("birthday"),
            TriggerType::Custom("birthday".to_string())
        );
    }

    #[test]
    fn test_trigger_type_serde_round_trip() {
        let json = serde_json::to_string(&TriggerType::DonationReceived).unwrap();
        assert_eq!(json, "\"donation_received\"");
        let back: TriggerType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TriggerType::DonationReceived);

        let custom: TriggerType = serde_json::from_str("\"anniversary\"").unwrap();
        assert_eq!(custom, TriggerType::Custom("anniversary".to_string()));
    }

    #[test]
    fn test_workflow_status_from_str() {
        assert_eq!(WorkflowStatus::from("ACTIVE"), WorkflowStatus::Active);
        assert_eq!(WorkflowStatus::from("paused"), WorkflowStatus::Paused);
        assert_eq!(WorkflowStatus::from("anything"), WorkflowStatus::Draft);
    }

    #[test]
    fn test_action_kind_round_trip() {
        for kind in [
            ActionKind::SendEmail,
            ActionKind::SendSms,
            ActionKind::CreateNotification,
            ActionKind::UpdateRecord,
            ActionKind::Custom,
        ] {
            assert_eq!(ActionKind::from(kind.to_string().as_str()), kind);
        }
    }

    #[test]
    fn test_action_delay() {
        let mut action = WorkflowAction {
            id: Uuid::new_v4(),
            workflow_id: Uuid::new_v4(),
            kind: "send_email".to_string(),
            position: 0,
            config: serde_json::json!({}),
            condition: None,
            delay_seconds: None,
        };
        assert!(action.delay().is_none());

        action.delay_seconds = Some(600);
        assert_eq!(action.delay(), Some(Duration::from_secs(600)));

        action.delay_seconds = Some(0);
        assert!(action.delay().is_none());
    }
}
