//! In-memory implementation of `ArticleRepository`.
//!
//! Useful for tests and embedded use. All state is lost on restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use newsdesk_core::article::{Article, ArticleStatus, StorageId};
use newsdesk_core::verdict::Verdict;

use super::{ArticleRepository, PublishWrite, ReasoningKind, ReasoningStep, RepositoryError};
use crate::dispatch::InterviewChannel;

struct StoredEntry {
    article: Article,
    verdict: Option<Verdict>,
    reasoning: Vec<ReasoningStep>,
    embedding: Option<Vec<f32>>,
    published_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
}

/// In-memory article repository backed by a `RwLock<HashMap>`.
pub struct InMemoryRepository {
    entries: RwLock<HashMap<i64, StoredEntry>>,
    /// tracking_handle -> (article row, channel, dispatched_at)
    interviews: RwLock<HashMap<String, (i64, InterviewChannel, DateTime<Utc>)>>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            interviews: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// The stored publish timestamp, if the article was published.
    pub async fn published_at(&self, id: StorageId) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries.get(&id.0).and_then(|entry| entry.published_at)
    }

    /// The stored embedding, if the article was published.
    pub async fn stored_embedding(&self, id: StorageId) -> Option<Vec<f32>> {
        let entries = self.entries.read().await;
        entries.get(&id.0).and_then(|entry| entry.embedding.clone())
    }

    /// The stored rejection timestamp, if the article was rejected.
    pub async fn rejected_at(&self, id: StorageId) -> Option<DateTime<Utc>> {
        let entries = self.entries.read().await;
        entries.get(&id.0).and_then(|entry| entry.rejected_at)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleRepository for InMemoryRepository {
    async fn upsert_article(&self, article: &Article) -> Result<StorageId, RepositoryError> {
        let mut entries = self.entries.write().await;

        if let Some(id) = article.storage_id {
            let entry = entries
                .get_mut(&id.0)
                .ok_or_else(|| RepositoryError::not_found(id))?;
            entry.article = article.clone();
            return Ok(id);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut stored = article.clone();
        stored.storage_id = Some(StorageId(id));
        entries.insert(
            id,
            StoredEntry {
                article: stored,
                verdict: None,
                reasoning: Vec::new(),
                embedding: None,
                published_at: None,
                rejected_at: None,
            },
        );
        Ok(StorageId(id))
    }

    async fn get_article(&self, id: StorageId) -> Result<Option<Article>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&id.0).map(|entry| entry.article.clone()))
    }

    async fn revision_count(&self, id: StorageId) -> Result<u32, RepositoryError> {
        let entries = self.entries.read().await;
        entries
            .get(&id.0)
            .map(|entry| entry.article.revision_count)
            .ok_or_else(|| RepositoryError::not_found(id))
    }

    async fn update_revision(
        &self,
        id: StorageId,
        title: &str,
        content: &str,
        revision_count: u32,
        required_corrections: bool,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::not_found(id))?;
        entry.article.title = title.to_string();
        entry.article.content = content.to_string();
        entry.article.revision_count = revision_count;
        entry.article.required_corrections = required_corrections;
        Ok(())
    }

    async fn publish(
        &self,
        id: StorageId,
        embedding: &[f32],
        published_at: DateTime<Utc>,
    ) -> Result<PublishWrite, RepositoryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::not_found(id))?;

        match entry.article.status {
            ArticleStatus::Published => Ok(PublishWrite::AlreadyPublished),
            ArticleStatus::Rejected => Err(RepositoryError::invalid_status("publish", "rejected")),
            ArticleStatus::Pending => {
                entry.article.status = ArticleStatus::Published;
                entry.embedding = Some(embedding.to_vec());
                entry.published_at = Some(published_at);
                Ok(PublishWrite::Applied)
            }
        }
    }

    async fn reject(
        &self,
        id: StorageId,
        rejected_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::not_found(id))?;

        match entry.article.status {
            ArticleStatus::Published => {
                Err(RepositoryError::invalid_status("reject", "published"))
            }
            ArticleStatus::Rejected => Ok(()),
            ArticleStatus::Pending => {
                entry.article.status = ArticleStatus::Rejected;
                entry.rejected_at = Some(rejected_at);
                Ok(())
            }
        }
    }

    async fn save_verdict(
        &self,
        id: StorageId,
        verdict: &Verdict,
        cycle: u32,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&id.0)
            .ok_or_else(|| RepositoryError::not_found(id))?;

        entry.verdict = Some(verdict.clone());

        entry.reasoning.retain(|step| step.cycle != cycle);
        if !verdict.reasoning.explanation.is_empty() {
            entry.reasoning.push(ReasoningStep {
                cycle,
                kind: ReasoningKind::Initial,
                body: verdict.reasoning.explanation.clone(),
            });
        }
        if let Some(reconsideration) = &verdict.reasoning.reconsideration {
            entry.reasoning.push(ReasoningStep {
                cycle,
                kind: ReasoningKind::Reconsideration,
                body: reconsideration.clone(),
            });
        }
        entry.reasoning.sort_by_key(|step| step.cycle);
        Ok(())
    }

    async fn load_verdict(&self, id: StorageId) -> Result<Option<Verdict>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&id.0).and_then(|entry| entry.verdict.clone()))
    }

    async fn reasoning_trail(
        &self,
        id: StorageId,
    ) -> Result<Vec<ReasoningStep>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&id.0)
            .map(|entry| entry.reasoning.clone())
            .unwrap_or_default())
    }

    async fn record_interview(
        &self,
        id: StorageId,
        channel: InterviewChannel,
        tracking_handle: &str,
        dispatched_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut interviews = self.interviews.write().await;
        interviews.insert(tracking_handle.to_string(), (id.0, channel, dispatched_at));
        Ok(())
    }

    async fn find_article_by_tracking_handle(
        &self,
        tracking_handle: &str,
    ) -> Result<Option<StorageId>, RepositoryError> {
        let interviews = self.interviews.read().await;
        Ok(interviews
            .get(tracking_handle)
            .map(|(row, _, _)| StorageId(*row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::verdict::ValidationResult;

    fn sample_article() -> Article {
        Article::new("a-1", "Headline", "Body text")
    }

    #[tokio::test]
    async fn test_upsert_assigns_identity() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_article(&sample_article()).await.unwrap();

        let stored = repo.get_article(id).await.unwrap().unwrap();
        assert_eq!(stored.storage_id, Some(id));
        assert_eq!(stored.title, "Headline");
    }

    #[tokio::test]
    async fn test_publish_is_idempotent() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_article(&sample_article()).await.unwrap();

        let first = repo
            .publish(id, &[0.1, 0.2], Utc::now())
            .await
            .unwrap();
        assert_eq!(first, PublishWrite::Applied);
        let first_published_at = repo.published_at(id).await.unwrap();

        let second = repo
            .publish(id, &[0.9, 0.9], Utc::now())
            .await
            .unwrap();
        assert_eq!(second, PublishWrite::AlreadyPublished);

        // The original write is untouched.
        assert_eq!(repo.published_at(id).await.unwrap(), first_published_at);
        assert_eq!(repo.stored_embedding(id).await.unwrap(), vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn test_reject_then_publish_is_an_error() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_article(&sample_article()).await.unwrap();

        repo.reject(id, Utc::now()).await.unwrap();
        let err = repo.publish(id, &[0.1], Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn test_save_verdict_is_idempotent_per_cycle() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_article(&sample_article()).await.unwrap();

        let mut verdict = Verdict::from_validation(
            &ValidationResult {
                all_fixes_verified: false,
                remaining_issues: vec!["still wrong".to_string()],
                summary: "first cycle reasoning".to_string(),
            },
            1,
        );
        verdict.reasoning.reconsideration = Some("second look".to_string());

        repo.save_verdict(id, &verdict, 1).await.unwrap();
        repo.save_verdict(id, &verdict, 1).await.unwrap();

        let trail = repo.reasoning_trail(id).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].kind, ReasoningKind::Initial);
        assert_eq!(trail[1].kind, ReasoningKind::Reconsideration);
    }

    #[tokio::test]
    async fn test_tracking_handle_lookup() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_article(&sample_article()).await.unwrap();

        repo.record_interview(id, InterviewChannel::Email, "email-42", Utc::now())
            .await
            .unwrap();

        assert_eq!(
            repo.find_article_by_tracking_handle("email-42")
                .await
                .unwrap(),
            Some(id)
        );
        assert_eq!(
            repo.find_article_by_tracking_handle("email-43")
                .await
                .unwrap(),
            None
        );
    }
}
