//! Transport collaborator contracts.
//!
//! The engine never owns delivery mechanics or contact-resolution logic; it
//! calls these narrow traits and treats every collaborator uniformly as
//! "send and get a result". Side effects are observable only through the
//! collaborator's own contract.

mod http;

pub use http::ChmsGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Contact details resolved for a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub member_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Receipt returned by a delivery collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Collaborator-side identifier of the queued message, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

/// Resolves member ids to contact information.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    async fn contact_for(&self, member_id: &str) -> AppResult<Contact>;
}

/// Queues an email for delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<DeliveryReceipt>;
}

/// Queues an SMS for delivery.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt>;
}

/// Writes an in-app notification for a member.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_notification(
        &self,
        member_id: &str,
        title: &str,
        body: &str,
    ) -> AppResult<DeliveryReceipt>;
}

/// Updates a single field on a member record.
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    async fn update_field(
        &self,
        member_id: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> AppResult<()>;
}

/// Delivers an operator-defined payload to an arbitrary URL.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn deliver(
        &self,
        url: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> AppResult<DeliveryReceipt>;
}
