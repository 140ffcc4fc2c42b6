//! HTTP gateway to the ChMS internal API.
//!
//! One reqwest client implements every collaborator trait against the main
//! church-management application's internal endpoints. The base URL and
//! bearer token are injected at construction time.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};

use super::{Contact, ContactDirectory, DeliveryReceipt, EmailSender, NotificationSink,
    RecordUpdater, SmsSender, WebhookSender};

/// HTTP client for the ChMS internal API.
#[derive(Clone)]
pub struct ChmsGateway {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

impl ChmsGateway {
    /// Create a new gateway from configuration.
    pub fn new(config: &GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_internal(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> AppResult<DeliveryReceipt> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        let parsed: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
        Ok(DeliveryReceipt {
            provider_id: parsed.id,
        })
    }
}

#[async_trait]
impl ContactDirectory for ChmsGateway {
    async fn contact_for(&self, member_id: &str) -> AppResult<Contact> {
        let response = self
            .client
            .get(self.url(&format!("/api/internal/members/{}/contact", member_id)))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Member not found: {}", member_id)));
        }
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Contact lookup returned {}: {}",
                status, detail
            )));
        }

        let contact: Contact = response.json().await?;
        Ok(contact)
    }
}

#[async_trait]
impl EmailSender for ChmsGateway {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<DeliveryReceipt> {
        self.post_internal(
            "/api/internal/messages/email",
            &serde_json::json!({
                "to": to,
                "subject": subject,
                "body": body,
            }),
        )
        .await
    }
}

#[async_trait]
impl SmsSender for ChmsGateway {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<DeliveryReceipt> {
        self.post_internal(
            "/api/internal/messages/sms",
            &serde_json::json!({
                "to": to,
                "body": body,
            }),
        )
        .await
    }
}

#[async_trait]
impl NotificationSink for ChmsGateway {
    async fn create_notification(
        &self,
        member_id: &str,
        title: &str,
        body: &str,
    ) -> AppResult<DeliveryReceipt> {
        self.post_internal(
            "/api/internal/notifications",
            &serde_json::json!({
                "member_id": member_id,
                "title": title,
                "body": body,
            }),
        )
        .await
    }
}

#[async_trait]
impl RecordUpdater for ChmsGateway {
    async fn update_field(
        &self,
        member_id: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> AppResult<()> {
        let response = self
            .client
            .patch(self.url(&format!("/api/internal/members/{}", member_id)))
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ field: value }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Record update returned {}: {}",
                status, detail
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl WebhookSender for ChmsGateway {
    async fn deliver(
        &self,
        url: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> AppResult<DeliveryReceipt> {
        let method = Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| AppError::Validation(format!("Invalid webhook method: {}", method)))?;

        let response = self
            .client
            .request(method, url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "Webhook {} returned {}",
                url, status
            )));
        }

        Ok(DeliveryReceipt { provider_id: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_trims_trailing_slash() {
        let config = GatewayConfig {
            base_url: "http://localhost:3000/".to_string(),
            api_token: "token".to_string(),
            timeout_seconds: 5,
        };
        let gateway = ChmsGateway::new(&config);
        assert_eq!(gateway.base_url, "http://localhost:3000");
        assert_eq!(
            gateway.url("/api/internal/notifications"),
            "http://localhost:3000/api/internal/notifications"
        );
    }

    #[test]
    fn test_send_response_parsing() {
        let parsed: SendResponse = serde_json::from_str(r#"{"id": "msg-1"}"#).unwrap();
        assert_eq!(parsed.id.as_deref(), Some("msg-1"));

        let parsed: SendResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.id.is_none());
    }
}
