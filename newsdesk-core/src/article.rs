//! Article types tracked through the editorial workflow.
//!
//! An article enters the workflow once enrichment is complete and leaves it
//! when a terminal handler sets `published` or `rejected`; everything in
//! between (under review, revising, awaiting an interview reply) is `pending`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for the stable article identifier assigned at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub String);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ArticleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Newtype for the canonical-news identifier, when deduplication matched one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalNewsId(pub String);

impl fmt::Display for CanonicalNewsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CanonicalNewsId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Newtype for the persisted-storage row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId(pub i64);

impl fmt::Display for StorageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StorageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Terminal-or-pending status of an article.
///
/// Set only by the terminal handlers; every intermediate workflow state
/// keeps the article `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Published,
    Rejected,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from the persisted status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "published" => Some(Self::Published),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Rejected)
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person the interview sub-flow can reach out to.
///
/// Supplied by the upstream content pipeline; read-only in this workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl Contact {
    /// Returns true if the contact can be reached by email.
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// Returns true if the contact can be reached by phone.
    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// The mutable entity owned by the workflow for its lifetime in this
/// subsystem.
///
/// Content fields are opaque to the workflow apart from non-emptiness
/// checks; the revision fields carry the bounded-retry safety state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub canonical_id: Option<CanonicalNewsId>,
    /// Present once the article has been persisted; terminal handlers
    /// refuse to run without it.
    pub storage_id: Option<StorageId>,
    pub title: String,
    pub content: String,
    pub language: String,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub contacts: Vec<Contact>,
    /// Completed revision cycles. Incremented exactly once per successful
    /// cycle, never on an extraction failure.
    pub revision_count: u32,
    /// Set the first time a revision is applied.
    pub required_corrections: bool,
    pub status: ArticleStatus,
}

impl Article {
    /// Create a fresh pending article with no revision history.
    pub fn new(id: impl Into<ArticleId>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            canonical_id: None,
            storage_id: None,
            title: title.into(),
            content: content.into(),
            language: "en".to_string(),
            categories: Vec::new(),
            keywords: Vec::new(),
            contacts: Vec::new(),
            revision_count: 0,
            required_corrections: false,
            status: ArticleStatus::Pending,
        }
    }

    /// Returns true if the article has been persisted.
    pub fn has_storage_identity(&self) -> bool {
        self.storage_id.is_some()
    }

    /// Overwrite title and content with a completed revision.
    ///
    /// Marks the article as corrected and consumes exactly one revision
    /// cycle. Callers must only invoke this after extraction succeeded.
    pub fn apply_revision(&mut self, title: String, content: String) {
        self.title = title;
        self.content = content;
        self.required_corrections = true;
        self.revision_count += 1;
    }
}
