//! Scripted collaborators and repositories for workflow tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use newsdesk_core::article::{Article, StorageId};
use newsdesk_core::verdict::{InterviewDecision, ReviewIssue, ValidationResult, Verdict};

use crate::collaborators::{CorrectionRequest, Embedder, FixValidator, QuestionWriter, Reviser};
use crate::dispatch::{DispatchReceipt, InterviewChannel, InterviewDispatcher, InterviewPlan};
use crate::repository::{
    ArticleRepository, InMemoryRepository, PublishWrite, ReasoningStep, RepositoryError,
};

/// Reviser returning scripted raw responses in order.
pub struct FakeReviser {
    responses: Mutex<VecDeque<String>>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl FakeReviser {
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            error: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reviser for FakeReviser {
    async fn revise(&self, _request: &CorrectionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.error {
            return Err(anyhow!("{}", message));
        }
        self.responses
            .lock()
            .expect("mutex poisoned")
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reviser response left"))
    }
}

/// Fix validator returning scripted results and recording what it saw.
pub struct FakeValidator {
    results: Mutex<VecDeque<ValidationResult>>,
    seen: Mutex<Vec<Vec<ReviewIssue>>>,
    calls: AtomicUsize,
}

impl FakeValidator {
    pub fn with_results(results: Vec<ValidationResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// The issue list handed to the first validation call.
    pub fn seen_issues(&self) -> Vec<ReviewIssue> {
        self.seen
            .lock()
            .expect("mutex poisoned")
            .first()
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FixValidator for FakeValidator {
    async fn validate(
        &self,
        issues: &[ReviewIssue],
        _title: &str,
        _content: &str,
    ) -> Result<ValidationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("mutex poisoned")
            .push(issues.to_vec());
        self.results
            .lock()
            .expect("mutex poisoned")
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted validation result left"))
    }
}

/// Question writer returning a fixed question list, or failing.
pub struct FakeQuestionWriter {
    questions: Vec<String>,
    error: Option<String>,
    calls: AtomicUsize,
}

impl FakeQuestionWriter {
    pub fn with_questions(questions: Vec<String>) -> Self {
        Self {
            questions,
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            questions: Vec::new(),
            error: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionWriter for FakeQuestionWriter {
    async fn write_questions(
        &self,
        _article: &Article,
        _decision: &InterviewDecision,
        max_questions: usize,
    ) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.error {
            return Err(anyhow!("{}", message));
        }
        Ok(self.questions.iter().take(max_questions).cloned().collect())
    }
}

/// Dispatcher recording every plan it was handed.
pub struct FakeDispatcher {
    error: Option<String>,
    plans: Mutex<Vec<InterviewPlan>>,
    counter: AtomicUsize,
}

impl FakeDispatcher {
    pub fn succeeding() -> Self {
        Self {
            error: None,
            plans: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            plans: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn dispatched_plans(&self) -> Vec<InterviewPlan> {
        self.plans.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl InterviewDispatcher for FakeDispatcher {
    async fn dispatch(&self, plan: &InterviewPlan) -> Result<DispatchReceipt> {
        if let Some(message) = &self.error {
            return Err(anyhow!("{}", message));
        }
        self.plans
            .lock()
            .expect("mutex poisoned")
            .push(plan.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(DispatchReceipt {
            channel: plan.channel,
            tracking_handle: format!("{}-test-{}", plan.channel, n),
        })
    }
}

/// Embedder producing fixed-dimension vectors, or failing.
pub struct FakeEmbedder {
    dimension: usize,
    error: Option<String>,
}

impl FakeEmbedder {
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            dimension: 0,
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(message) = &self.error {
            return Err(anyhow!("{}", message));
        }
        let seed = (text.len() % 97) as f32 / 97.0;
        Ok(vec![seed; self.dimension])
    }
}

/// Repository whose audit writes always fail, for exercising the
/// best-effort reject path.
pub struct SabotagedAuditRepo {
    inner: InMemoryRepository,
}

impl SabotagedAuditRepo {
    pub fn new(inner: InMemoryRepository) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &InMemoryRepository {
        &self.inner
    }
}

#[async_trait]
impl ArticleRepository for SabotagedAuditRepo {
    async fn upsert_article(&self, article: &Article) -> Result<StorageId, RepositoryError> {
        self.inner.upsert_article(article).await
    }

    async fn get_article(&self, id: StorageId) -> Result<Option<Article>, RepositoryError> {
        self.inner.get_article(id).await
    }

    async fn revision_count(&self, id: StorageId) -> Result<u32, RepositoryError> {
        self.inner.revision_count(id).await
    }

    async fn update_revision(
        &self,
        id: StorageId,
        title: &str,
        content: &str,
        revision_count: u32,
        required_corrections: bool,
    ) -> Result<(), RepositoryError> {
        self.inner
            .update_revision(id, title, content, revision_count, required_corrections)
            .await
    }

    async fn publish(
        &self,
        id: StorageId,
        embedding: &[f32],
        published_at: DateTime<Utc>,
    ) -> Result<PublishWrite, RepositoryError> {
        self.inner.publish(id, embedding, published_at).await
    }

    async fn reject(
        &self,
        id: StorageId,
        rejected_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.inner.reject(id, rejected_at).await
    }

    async fn save_verdict(
        &self,
        _id: StorageId,
        _verdict: &Verdict,
        _cycle: u32,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::storage("save verdict", "audit store down"))
    }

    async fn load_verdict(&self, id: StorageId) -> Result<Option<Verdict>, RepositoryError> {
        self.inner.load_verdict(id).await
    }

    async fn reasoning_trail(
        &self,
        id: StorageId,
    ) -> Result<Vec<ReasoningStep>, RepositoryError> {
        self.inner.reasoning_trail(id).await
    }

    async fn record_interview(
        &self,
        id: StorageId,
        channel: InterviewChannel,
        tracking_handle: &str,
        dispatched_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.inner
            .record_interview(id, channel, tracking_handle, dispatched_at)
            .await
    }

    async fn find_article_by_tracking_handle(
        &self,
        tracking_handle: &str,
    ) -> Result<Option<StorageId>, RepositoryError> {
        self.inner
            .find_article_by_tracking_handle(tracking_handle)
            .await
    }
}
