//! Action execution.
//!
//! Dispatches over the closed set of action kinds. Each kind resolves its
//! dynamic references against the event payload, performs exactly one
//! side-effecting call to its collaborator, and returns a result. Failures
//! never escape this boundary; the engine records them and carries on.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::db::models::{ActionKind, ActionStatus, WorkflowAction};
use crate::engine::condition::lookup;
use crate::engine::event::TriggerEvent;
use crate::error::{AppError, AppResult};
use crate::template::TemplateRenderer;
use crate::transport::{ContactDirectory, EmailSender, NotificationSink, RecordUpdater,
    SmsSender, WebhookSender};

/// Outcome of one action, recorded in the audit trail.
#[derive(Debug, Clone)]
pub enum ActionResult {
    Succeeded { detail: serde_json::Value },
    Failed { error: String },
}

impl ActionResult {
    pub fn succeeded(detail: serde_json::Value) -> Self {
        Self::Succeeded { detail }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The action status this result maps to.
    pub fn status(&self) -> ActionStatus {
        match self {
            Self::Succeeded { .. } => ActionStatus::Succeeded,
            Self::Failed { .. } => ActionStatus::Failed,
        }
    }
}

/// Send-email configuration.
#[derive(Debug, Deserialize)]
struct EmailConfig {
    /// Dotted payload path holding the recipient's member id.
    #[serde(default = "default_recipient_path")]
    recipient_path: String,
    subject: String,
    body: String,
}

/// Send-SMS configuration.
#[derive(Debug, Deserialize)]
struct SmsConfig {
    #[serde(default = "default_recipient_path")]
    recipient_path: String,
    body: String,
}

/// Create-notification configuration.
#[derive(Debug, Deserialize)]
struct NotificationConfig {
    #[serde(default = "default_recipient_path")]
    recipient_path: String,
    title: String,
    body: String,
}

/// Update-record configuration.
#[derive(Debug, Deserialize)]
struct UpdateRecordConfig {
    #[serde(default = "default_recipient_path")]
    record_path: String,
    field: String,
    value: serde_json::Value,
}

/// Custom (webhook) configuration.
#[derive(Debug, Deserialize)]
struct CustomConfig {
    url: String,
    #[serde(default = "default_webhook_method")]
    method: String,
    #[serde(default)]
    payload: serde_json::Value,
}

fn default_recipient_path() -> String {
    "member_id".to_string()
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

/// Executes workflow actions through the transport collaborators.
pub struct ActionExecutor {
    directory: Arc<dyn ContactDirectory>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    notifications: Arc<dyn NotificationSink>,
    records: Arc<dyn RecordUpdater>,
    webhooks: Arc<dyn WebhookSender>,
    renderer: TemplateRenderer,
}

impl ActionExecutor {
    /// Create an executor over the given collaborators.
    pub fn new(
        directory: Arc<dyn ContactDirectory>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        notifications: Arc<dyn NotificationSink>,
        records: Arc<dyn RecordUpdater>,
        webhooks: Arc<dyn WebhookSender>,
    ) -> Self {
        Self {
            directory,
            email,
            sms,
            notifications,
            records,
            webhooks,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Execute one action against one event. Never raises: every failure is
    /// captured into the returned result.
    pub async fn execute(&self, action: &WorkflowAction, event: &TriggerEvent) -> ActionResult {
        debug!(
            action_id = %action.id,
            kind = %action.kind,
            position = action.position,
            "Executing action"
        );

        match self.run(action, event).await {
            Ok(detail) => ActionResult::succeeded(detail),
            Err(e) => ActionResult::failed(e.to_string()),
        }
    }

    async fn run(
        &self,
        action: &WorkflowAction,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        match action.action_kind() {
            ActionKind::SendEmail => self.send_email(&action.config, event).await,
            ActionKind::SendSms => self.send_sms(&action.config, event).await,
            ActionKind::CreateNotification => self.create_notification(&action.config, event).await,
            ActionKind::UpdateRecord => self.update_record(&action.config, event).await,
            ActionKind::Custom => self.deliver_webhook(&action.config, event).await,
        }
    }

    async fn send_email(
        &self,
        config: &serde_json::Value,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        let config: EmailConfig = parse_config(config)?;

        let member_id = resolve_reference(&event.payload, &config.recipient_path)?;
        let contact = self.directory.contact_for(&member_id).await?;
        let to = contact.email.clone().ok_or_else(|| {
            AppError::Validation(format!("Member {} has no email address", member_id))
        })?;

        let context = render_context(event, &contact);
        let subject = self.renderer.render(&config.subject, &context)?;
        let body = self.renderer.render(&config.body, &context)?;

        let receipt = self.email.send_email(&to, &subject, &body).await?;

        Ok(serde_json::json!({
            "recipient": to,
            "subject": subject,
            "provider_id": receipt.provider_id,
        }))
    }

    async fn send_sms(
        &self,
        config: &serde_json::Value,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        let config: SmsConfig = parse_config(config)?;

        let member_id = resolve_reference(&event.payload, &config.recipient_path)?;
        let contact = self.directory.contact_for(&member_id).await?;
        let to = contact.phone.clone().ok_or_else(|| {
            AppError::Validation(format!("Member {} has no phone number", member_id))
        })?;

        let context = render_context(event, &contact);
        let body = self.renderer.render(&config.body, &context)?;

        let receipt = self.sms.send_sms(&to, &body).await?;

        Ok(serde_json::json!({
            "recipient": to,
            "provider_id": receipt.provider_id,
        }))
    }

    async fn create_notification(
        &self,
        config: &serde_json::Value,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        let config: NotificationConfig = parse_config(config)?;

        let member_id = resolve_reference(&event.payload, &config.recipient_path)?;
        let title = self.renderer.render(&config.title, &event.payload)?;
        let body = self.renderer.render(&config.body, &event.payload)?;

        let receipt = self
            .notifications
            .create_notification(&member_id, &title, &body)
            .await?;

        Ok(serde_json::json!({
            "member_id": member_id,
            "title": title,
            "notification_id": receipt.provider_id,
        }))
    }

    async fn update_record(
        &self,
        config: &serde_json::Value,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        let config: UpdateRecordConfig = parse_config(config)?;

        let member_id = resolve_reference(&event.payload, &config.record_path)?;
        let value = self.renderer.render_value(&config.value, &event.payload)?;

        self.records
            .update_field(&member_id, &config.field, &value)
            .await?;

        Ok(serde_json::json!({
            "member_id": member_id,
            "field": config.field,
            "value": value,
        }))
    }

    async fn deliver_webhook(
        &self,
        config: &serde_json::Value,
        event: &TriggerEvent,
    ) -> AppResult<serde_json::Value> {
        let config: CustomConfig = parse_config(config)?;

        let body = serde_json::json!({
            "trigger": event.trigger.to_string(),
            "payload": self.renderer.render_value(&config.payload, &event.payload)?,
            "occurred_at": event.occurred_at,
        });

        let receipt = self.webhooks.deliver(&config.url, &config.method, &body).await?;

        Ok(serde_json::json!({
            "url": config.url,
            "provider_id": receipt.provider_id,
        }))
    }
}

/// Parse a kind-specific configuration payload.
fn parse_config<T: serde::de::DeserializeOwned>(config: &serde_json::Value) -> AppResult<T> {
    serde_json::from_value(config.clone())
        .map_err(|e| AppError::Validation(format!("Invalid action configuration: {}", e)))
}

/// Resolve a dotted payload path to a string reference (member id).
fn resolve_reference(payload: &serde_json::Value, path: &str) -> AppResult<String> {
    let value = lookup(payload, path)
        .ok_or_else(|| AppError::Validation(format!("No value at payload path '{}'", path)))?;

    match value {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(AppError::Validation(format!(
            "Payload path '{}' does not hold a usable reference",
            path
        ))),
    }
}

/// Template context: the event payload with the resolved contact merged in
/// under `member`, so templates can use `{{ member.first_name }}` even when
/// the payload only carried an id.
fn render_context(event: &TriggerEvent, contact: &crate::transport::Contact) -> serde_json::Value {
    let mut context = match &event.payload {
        serde_json::Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    context.insert(
        "member".to_string(),
        serde_json::to_value(contact).unwrap_or_default(),
    );
    serde_json::Value::Object(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TriggerType;
    use crate::engine::testing::{mock_executor, Mocks};
    use serde_json::json;
    use uuid::Uuid;

    fn make_action(kind: &str, config: serde_json::Value) -> WorkflowAction {
        WorkflowAction {
            id: Uuid::new_v4(),
            workflow_id: Uuid::new_v4(),
            kind: kind.to_string(),
            position: 0,
            config,
            condition: None,
            delay_seconds: None,
        }
    }

    fn donation_event() -> TriggerEvent {
        TriggerEvent::new(
            TriggerType::DonationReceived,
            json!({"member_id": "m-1", "amount": 500}),
        )
    }

    #[tokio::test]
    async fn test_send_email_resolves_and_renders() {
        let mocks = Mocks::new();
        let executor = mock_executor(&mocks);

        let action = make_action(
            "send_email",
            json!({
                "subject": "Thank you {{ member.first_name }}",
                "body": "We received KES {{ amount }}."
            }),
        );

        let result = executor.execute(&action, &donation_event()).await;
        assert!(result.is_success());

        let sent = mocks.emails.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "grace@example.org");
        assert_eq!(sent[0].1, "Thank you Grace");
        assert_eq!(sent[0].2, "We received KES 500.");
    }

    #[tokio::test]
    async fn test_send_email_transport_failure_is_captured() {
        let mocks = Mocks::new();
        mocks.fail_email();
        let executor = mock_executor(&mocks);

        let action = make_action("send_email", json!({"subject": "s", "body": "b"}));
        let result = executor.execute(&action, &donation_event()).await;

        match result {
            ActionResult::Failed { error } => assert!(error.contains("mail queue down")),
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_missing_recipient_reference_fails() {
        let mocks = Mocks::new();
        let executor = mock_executor(&mocks);

        let action = make_action("send_sms", json!({"body": "hi"}));
        let event = TriggerEvent::new(TriggerType::MemberCreated, json!({"something": 1}));

        let result = executor.execute(&action, &event).await;
        assert!(!result.is_success());
        assert!(mocks.sms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_without_side_effects() {
        let mocks = Mocks::new();
        let executor = mock_executor(&mocks);

        // subject/body missing entirely
        let action = make_action("send_email", json!({"recipient_path": "member_id"}));
        let result = executor.execute(&action, &donation_event()).await;

        assert!(!result.is_success());
        assert!(mocks.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_record() {
        let mocks = Mocks::new();
        let executor = mock_executor(&mocks);

        let action = make_action(
            "update_record",
            json!({"field": "last_contacted", "value": "workflow"}),
        );
        let result = executor.execute(&action, &donation_event()).await;
        assert!(result.is_success());

        let updates = mocks.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "m-1");
        assert_eq!(updates[0].1, "last_contacted");
    }

    #[tokio::test]
    async fn test_custom_webhook_dispatch() {
        let mocks = Mocks::new();
        let executor = mock_executor(&mocks);

        let action = make_action(
            "custom",
            json!({"url": "https://hooks.example.org/give", "payload": {"amount": "{{ amount }}"}}),
        );
        let result = executor.execute(&action, &donation_event()).await;
        assert!(result.is_success());

        let hooks = mocks.webhooks.lock().unwrap();
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].0, "https://hooks.example.org/give");
        assert_eq!(hooks[0].1, "POST");
    }

    #[test]
    fn test_resolve_reference_numeric_id() {
        let payload = json!({"member_id": 42});
        assert_eq!(resolve_reference(&payload, "member_id").unwrap(), "42");
    }
}
