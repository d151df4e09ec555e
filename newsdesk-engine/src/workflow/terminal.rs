//! Terminal handlers: publish and reject.
//!
//! Both handlers require a storage identity; neither creates one. Publish
//! writes status, embedding, and timestamp in a single transaction so a
//! partial write is impossible. Reject keeps the status transition even
//! when the best-effort audit write fails: an article must never stay
//! pending merely because the audit log failed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use newsdesk_core::article::{Article, ArticleStatus};
use newsdesk_core::verdict::Verdict;

use crate::collaborators::{call_with_timeout, Embedder};
use crate::repository::{ArticleRepository, PublishWrite, RepositoryError};

/// What the publish handler did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { published_at: DateTime<Utc> },
    /// The article was already published; the call was a no-op.
    AlreadyPublished,
}

/// What the reject handler did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectOutcome {
    pub rejected_at: DateTime<Utc>,
    /// False when the status transition was kept but the audit write
    /// failed; the failure is reported separately via this flag.
    pub audit_persisted: bool,
}

/// Why a terminal handler refused or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    /// The article has no storage identity; the handler does not create
    /// one.
    MissingStorageIdentity,
    /// The embedding collaborator failed; the status was not changed.
    Embedding { message: String },
    /// The status transition itself failed.
    Repository(RepositoryError),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStorageIdentity => {
                write!(f, "article has no storage identity")
            }
            Self::Embedding { message } => write!(f, "embedding generation failed: {}", message),
            Self::Repository(e) => write!(f, "status transition failed: {}", e),
        }
    }
}

impl std::error::Error for TerminalError {}

/// Publish the article: embedding, status, and timestamp move atomically.
pub async fn publish(
    repository: &dyn ArticleRepository,
    embedder: &dyn Embedder,
    article: &mut Article,
    timeout: Duration,
) -> Result<PublishOutcome, TerminalError> {
    let storage_id = article
        .storage_id
        .ok_or(TerminalError::MissingStorageIdentity)?;

    let text = format!("{}\n\n{}", article.title, article.content);
    let embedding = call_with_timeout(timeout, "embedding generation", embedder.embed(&text))
        .await
        .map_err(|e| TerminalError::Embedding {
            message: e.to_string(),
        })?;

    let published_at = Utc::now();
    let write = repository
        .publish(storage_id, &embedding, published_at)
        .await
        .map_err(TerminalError::Repository)?;

    article.status = ArticleStatus::Published;

    match write {
        PublishWrite::Applied => {
            info!("Published article {} ({})", article.id, storage_id);
            Ok(PublishOutcome::Published { published_at })
        }
        PublishWrite::AlreadyPublished => {
            info!(
                "Article {} ({}) was already published; no-op",
                article.id, storage_id
            );
            Ok(PublishOutcome::AlreadyPublished)
        }
    }
}

/// Reject the article, then attempt the audit write best-effort.
///
/// `cycle` is the revision cycle the final verdict belongs to.
pub async fn reject(
    repository: &dyn ArticleRepository,
    article: &mut Article,
    verdict: &Verdict,
    cycle: u32,
) -> Result<RejectOutcome, TerminalError> {
    let storage_id = article
        .storage_id
        .ok_or(TerminalError::MissingStorageIdentity)?;

    let rejected_at = Utc::now();
    repository
        .reject(storage_id, rejected_at)
        .await
        .map_err(TerminalError::Repository)?;

    article.status = ArticleStatus::Rejected;
    info!("Rejected article {} ({})", article.id, storage_id);

    // The status change above is kept even if this fails.
    let audit_persisted = match repository.save_verdict(storage_id, verdict, cycle).await {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Audit persistence failed for rejected article {} ({}): {}",
                article.id, storage_id, e
            );
            false
        }
    };

    Ok(RejectOutcome {
        rejected_at,
        audit_persisted,
    })
}
