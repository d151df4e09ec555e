//! Interview dispatch: channels, plans, and the dispatcher boundary.
//!
//! Dispatch is an external collaborator: the engine hands a finished
//! interview plan to a channel-specific transmission service and records the
//! tracking handle it returns. The engine never blocks waiting for a reply;
//! replies arrive asynchronously and are correlated back to an article by
//! their tracking handle.

mod email;
mod phone;

pub use email::MailRelayClient;
pub use phone::CallServiceClient;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

use newsdesk_core::article::ArticleId;

/// The channel an interview is dispatched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewChannel {
    Email,
    Phone,
}

impl InterviewChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }
}

impl fmt::Display for InterviewChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully resolved interview ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewPlan {
    pub article_id: ArticleId,
    pub channel: InterviewChannel,
    pub recipient_name: String,
    /// Email address or phone number, depending on the channel.
    pub recipient_address: String,
    pub subject: String,
    pub questions: Vec<String>,
    /// Rendered email body or call script.
    pub message: String,
}

/// Proof of a successful dispatch.
///
/// The tracking handle is the correlation key for the eventual reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub channel: InterviewChannel,
    pub tracking_handle: String,
}

/// An asynchronous reply delivered by the channel, to be correlated back to
/// its article before the workflow is re-entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewReply {
    pub tracking_handle: String,
    pub content: String,
}

/// Channel-specific transmission collaborator.
#[async_trait]
pub trait InterviewDispatcher: Send + Sync {
    /// Transmit the plan through its channel, returning a tracking handle.
    async fn dispatch(&self, plan: &InterviewPlan) -> Result<DispatchReceipt>;
}

/// Dispatcher that routes a plan to the matching channel client.
pub struct DualChannelDispatcher {
    email: MailRelayClient,
    phone: CallServiceClient,
}

impl DualChannelDispatcher {
    pub fn new(email: MailRelayClient, phone: CallServiceClient) -> Self {
        Self { email, phone }
    }
}

#[async_trait]
impl InterviewDispatcher for DualChannelDispatcher {
    async fn dispatch(&self, plan: &InterviewPlan) -> Result<DispatchReceipt> {
        match plan.channel {
            InterviewChannel::Email => self.email.send(plan).await,
            InterviewChannel::Phone => self.phone.trigger_call(plan).await,
        }
    }
}
