//! Shared mock collaborators for engine tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::engine::executor::ActionExecutor;
use crate::error::{AppError, AppResult};
use crate::transport::{Contact, ContactDirectory, DeliveryReceipt, EmailSender,
    NotificationSink, RecordUpdater, SmsSender, WebhookSender};

/// Recording transports: every call is appended to the matching log.
#[derive(Clone, Default)]
pub struct Mocks {
    pub emails: Arc<Mutex<Vec<(String, String, String)>>>,
    pub sms: Arc<Mutex<Vec<(String, String)>>>,
    pub notifications: Arc<Mutex<Vec<(String, String, String)>>>,
    pub updates: Arc<Mutex<Vec<(String, String, serde_json::Value)>>>,
    pub webhooks: Arc<Mutex<Vec<(String, String, serde_json::Value)>>>,
    email_failing: Arc<AtomicBool>,
    sms_failing: Arc<AtomicBool>,
}

impl Mocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent email sends fail.
    pub fn fail_email(&self) {
        self.email_failing.store(true, Ordering::SeqCst);
    }

    /// Make subsequent SMS sends fail.
    pub fn fail_sms(&self) {
        self.sms_failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContactDirectory for Mocks {
    async fn contact_for(&self, member_id: &str) -> AppResult<Contact> {
        Ok(Contact {
            member_id: member_id.to_string(),
            email: Some("grace@example.org".to_string()),
            phone: Some("+254700000001".to_string()),
            first_name: Some("Grace".to_string()),
            last_name: Some("Mwangi".to_string()),
        })
    }
}

#[async_trait]
impl EmailSender for Mocks {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<DeliveryReceipt> {
        if self.email_failing.load(Ordering::SeqCst) {
            return Err(AppError::Transport("mail queue down".to_string()));
        }
        self.emails
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(DeliveryReceipt {
            provider_id: Some("email-1".to_string()),
        })
    }
}

#[async_trait]
impl SmsSender for Mocks {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt> {
        if self.sms_failing.load(Ordering::SeqCst) {
            return Err(AppError::Transport("sms gateway down".to_string()));
        }
        self.sms
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(DeliveryReceipt {
            provider_id: Some("sms-1".to_string()),
        })
    }
}

#[async_trait]
impl NotificationSink for Mocks {
    async fn create_notification(
        &self,
        member_id: &str,
        title: &str,
        body: &str,
    ) -> AppResult<DeliveryReceipt> {
        self.notifications.lock().unwrap().push((
            member_id.to_string(),
            title.to_string(),
            body.to_string(),
        ));
        Ok(DeliveryReceipt { provider_id: None })
    }
}

#[async_trait]
impl RecordUpdater for Mocks {
    async fn update_field(
        &self,
        member_id: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> AppResult<()> {
        self.updates.lock().unwrap().push((
            member_id.to_string(),
            field.to_string(),
            value.clone(),
        ));
        Ok(())
    }
}

#[async_trait]
impl WebhookSender for Mocks {
    async fn deliver(
        &self,
        url: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> AppResult<DeliveryReceipt> {
        self.webhooks.lock().unwrap().push((
            url.to_string(),
            method.to_string(),
            payload.clone(),
        ));
        Ok(DeliveryReceipt { provider_id: None })
    }
}

/// An executor wired entirely to the mock transports.
pub fn mock_executor(mocks: &Mocks) -> ActionExecutor {
    let shared = Arc::new(mocks.clone());
    ActionExecutor::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
    )
}
