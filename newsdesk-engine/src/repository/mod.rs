//! Repository abstraction for article and audit persistence.
//!
//! This module defines the `ArticleRepository` trait that abstracts storage
//! for article state, the per-article audit trail, and interview dispatch
//! records. Implementations provide different backends (in-memory, SQLite).
//!
//! The persisted state is authoritative: the engine re-reads the revision
//! count before enforcing the revision bound, and a crashed workflow is
//! resumed from the last persisted verdict, never from memory.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use newsdesk_core::article::{Article, StorageId};
use newsdesk_core::verdict::Verdict;

use crate::dispatch::InterviewChannel;

/// Errors from repository operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A storage operation failed.
    Storage { operation: String, message: String },
    /// The referenced article row does not exist.
    NotFound { storage_id: StorageId },
    /// The requested transition is not valid for the row's current status.
    InvalidStatus {
        operation: String,
        current: String,
    },
}

impl RepositoryError {
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn not_found(storage_id: StorageId) -> Self {
        Self::NotFound { storage_id }
    }

    pub fn invalid_status(operation: impl Into<String>, current: impl Into<String>) -> Self {
        Self::InvalidStatus {
            operation: operation.into(),
            current: current.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { operation, message } => {
                write!(f, "storage operation '{}' failed: {}", operation, message)
            }
            Self::NotFound { storage_id } => {
                write!(f, "article {} not found", storage_id)
            }
            Self::InvalidStatus { operation, current } => {
                write!(f, "cannot {} an article with status '{}'", operation, current)
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

/// What the publish transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishWrite {
    /// Status, embedding, and timestamp were written in one transaction.
    Applied,
    /// The article was already published; nothing was written.
    AlreadyPublished,
}

/// Whether a persisted reasoning step came from the initial pass or a
/// reconsideration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningKind {
    Initial,
    Reconsideration,
}

impl ReasoningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Reconsideration => "reconsideration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(Self::Initial),
            "reconsideration" => Some(Self::Reconsideration),
            _ => None,
        }
    }
}

/// One persisted reasoning step from the audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningStep {
    /// Revision cycle the step belongs to (0 for the initial review).
    pub cycle: u32,
    pub kind: ReasoningKind,
    pub body: String,
}

/// Repository trait for persisting articles, verdicts, and interview
/// dispatch records.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert or update the article row, returning its storage identity.
    async fn upsert_article(&self, article: &Article) -> Result<StorageId, RepositoryError>;

    /// Load an article by storage identity.
    async fn get_article(&self, id: StorageId) -> Result<Option<Article>, RepositoryError>;

    /// Read the most recently persisted revision count.
    async fn revision_count(&self, id: StorageId) -> Result<u32, RepositoryError>;

    /// Persist a completed revision (title, content, counters).
    async fn update_revision(
        &self,
        id: StorageId,
        title: &str,
        content: &str,
        revision_count: u32,
        required_corrections: bool,
    ) -> Result<(), RepositoryError>;

    /// Publish: status, embedding, and timestamp in a single transaction.
    ///
    /// Re-publishing an already-published article is a no-op reported as
    /// [`PublishWrite::AlreadyPublished`]; publishing a rejected article is
    /// an error.
    async fn publish(
        &self,
        id: StorageId,
        embedding: &[f32],
        published_at: DateTime<Utc>,
    ) -> Result<PublishWrite, RepositoryError>;

    /// Flip the status to rejected. Idempotent for already-rejected rows;
    /// rejecting a published article is an error.
    async fn reject(&self, id: StorageId, rejected_at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Persist the latest verdict and its issues (replace), appending the
    /// verdict's reasoning under the given cycle number. Re-saving the same
    /// cycle replaces that cycle's steps rather than duplicating them.
    async fn save_verdict(
        &self,
        id: StorageId,
        verdict: &Verdict,
        cycle: u32,
    ) -> Result<(), RepositoryError>;

    /// Load the last persisted verdict, if any.
    async fn load_verdict(&self, id: StorageId) -> Result<Option<Verdict>, RepositoryError>;

    /// The full persisted reasoning trail, ordered by cycle then insertion.
    async fn reasoning_trail(&self, id: StorageId) -> Result<Vec<ReasoningStep>, RepositoryError>;

    /// Record a dispatched interview so the eventual reply can be
    /// correlated back to its article.
    async fn record_interview(
        &self,
        id: StorageId,
        channel: InterviewChannel,
        tracking_handle: &str,
        dispatched_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Resolve a tracking handle back to the article it belongs to.
    async fn find_article_by_tracking_handle(
        &self,
        tracking_handle: &str,
    ) -> Result<Option<StorageId>, RepositoryError>;
}
