//! Email interview dispatch through the HTTP mail relay.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{DispatchReceipt, InterviewChannel, InterviewPlan};

/// Client for the mail relay service.
#[derive(Clone)]
pub struct MailRelayClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    from_address: String,
}

#[derive(Debug, Serialize)]
struct SendMailRequest {
    from: String,
    to: String,
    subject: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct SendMailResponse {
    message_id: String,
}

impl MailRelayClient {
    pub fn new(base_url: String, token: String, from_address: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("newsdesk/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            token,
            from_address,
        }
    }

    /// Send the interview email and return its tracking handle.
    pub async fn send(&self, plan: &InterviewPlan) -> Result<DispatchReceipt> {
        let request = SendMailRequest {
            from: self.from_address.clone(),
            to: plan.recipient_address.clone(),
            subject: plan.subject.clone(),
            body: plan.message.clone(),
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .json(&request)
            .send()
            .await
            .context("Failed to send mail relay request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            return Err(anyhow!("Mail relay error: {} - {}", status, error_text));
        }

        let send_response: SendMailResponse = response
            .json()
            .await
            .context("Failed to parse mail relay response")?;

        let tracking_handle = format!("email-{}", send_response.message_id);
        info!(
            "Dispatched email interview for article {} ({})",
            plan.article_id, tracking_handle
        );

        Ok(DispatchReceipt {
            channel: InterviewChannel::Email,
            tracking_handle,
        })
    }
}
