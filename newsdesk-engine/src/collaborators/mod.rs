//! Collaborator boundary traits.
//!
//! Every judgment and rewrite in this workflow is produced by an external
//! collaborator behind one of these traits. Collaborator calls are slow,
//! blocking, fallible network operations; each invocation goes through
//! [`call_with_timeout`] and is never retried automatically, since unbounded
//! retry would defeat the revision-count safety bound.

mod agents;

pub use agents::{LlmEditor, LlmEmbedder, LlmFixValidator, LlmQuestionWriter, LlmReviser};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::error;

use newsdesk_core::article::Article;
use newsdesk_core::verdict::{InterviewDecision, ReviewIssue, ValidationResult, Verdict};

/// The correction request handed to the reviser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectionRequest {
    pub title: String,
    pub content: String,
    pub issues: Vec<ReviewIssue>,
    pub feedback: String,
    /// Reconsideration notes, interview findings, editorial warning.
    pub context: Option<String>,
}

/// The opaque judge that inspects an article and produces a verdict.
///
/// The workflow itself never calls the editor; the orchestrator does, via
/// [`verdict_or_reject`], before entering the decision router.
#[async_trait]
pub trait Editor: Send + Sync {
    async fn review(&self, article: &Article) -> Result<Verdict>;
}

/// Rewrites article content given a list of issues.
///
/// Returns the raw response text; extraction of title and content from it
/// is the revision controller's job and must fail loudly.
#[async_trait]
pub trait Reviser: Send + Sync {
    async fn revise(&self, request: &CorrectionRequest) -> Result<String>;
}

/// Checks whether specific prior issues were resolved in revised text.
#[async_trait]
pub trait FixValidator: Send + Sync {
    async fn validate(
        &self,
        issues: &[ReviewIssue],
        title: &str,
        content: &str,
    ) -> Result<ValidationResult>;
}

/// Writes interview questions for a human source.
#[async_trait]
pub trait QuestionWriter: Send + Sync {
    async fn write_questions(
        &self,
        article: &Article,
        decision: &InterviewDecision,
        max_questions: usize,
    ) -> Result<Vec<String>>;
}

/// Produces the content embedding written at publish time.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Bound a collaborator invocation with a timeout.
pub async fn call_with_timeout<T, F>(limit: Duration, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!(
            "{} timed out after {}s",
            operation,
            limit.as_secs()
        )),
    }
}

/// Run the editor, substituting a deterministic rejecting verdict on any
/// failure. The caller always receives a verdict, never an absence of one.
pub async fn verdict_or_reject(
    editor: &dyn Editor,
    article: &Article,
    timeout: Duration,
) -> Verdict {
    match call_with_timeout(timeout, "editorial review", editor.review(article)).await {
        Ok(verdict) => verdict,
        Err(e) => {
            error!("Editorial review failed for article {}: {}", article.id, e);
            Verdict::technical_failure("editorial review", &e.to_string())
        }
    }
}
