//! Phone interview dispatch through the call-triggering service.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{DispatchReceipt, InterviewChannel, InterviewPlan};

/// Client for the remote call-triggering service.
#[derive(Clone)]
pub struct CallServiceClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Serialize)]
struct TriggerCallRequest {
    to: String,
    recipient_name: String,
    script: String,
}

#[derive(Debug, Deserialize)]
struct TriggerCallResponse {
    call_id: String,
}

impl CallServiceClient {
    pub fn new(base_url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("newsdesk/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            token,
        }
    }

    /// Trigger the interview call and return its tracking handle.
    pub async fn trigger_call(&self, plan: &InterviewPlan) -> Result<DispatchReceipt> {
        let request = TriggerCallRequest {
            to: plan.recipient_address.clone(),
            recipient_name: plan.recipient_name.clone(),
            script: plan.message.clone(),
        };

        let response = self
            .client
            .post(format!("{}/calls", self.base_url))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .json(&request)
            .send()
            .await
            .context("Failed to send call trigger request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .context("Failed to read error response body")?;
            return Err(anyhow!("Call service error: {} - {}", status, error_text));
        }

        let call_response: TriggerCallResponse = response
            .json()
            .await
            .context("Failed to parse call service response")?;

        let tracking_handle = format!("phone-{}", call_response.call_id);
        info!(
            "Triggered phone interview for article {} ({})",
            plan.article_id, tracking_handle
        );

        Ok(DispatchReceipt {
            channel: InterviewChannel::Phone,
            tracking_handle,
        })
    }
}
