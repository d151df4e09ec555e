//! SQLite implementation of `ArticleRepository`.
//!
//! This provides durable storage that survives restarts: the article row,
//! the latest verdict with its issues, the append-only reasoning trail, and
//! interview dispatch records all live here.
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table that tracks the schema version.
//! When the schema needs to change, increment `CURRENT_SCHEMA_VERSION` and
//! add a migration in `run_migrations()`. Migrations run sequentially from
//! the current version to the target version.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use newsdesk_core::article::{Article, ArticleId, ArticleStatus, CanonicalNewsId, StorageId};
use newsdesk_core::verdict::{
    EditorialDecision, InterviewDecision, InterviewMethod, Reasoning, ReviewIssue, Verdict,
    VerdictStatus,
};

use super::{ArticleRepository, PublishWrite, ReasoningKind, ReasoningStep, RepositoryError};
use crate::dispatch::InterviewChannel;

/// Current schema version. Increment this when making schema changes and
/// add corresponding migration logic in `run_migrations()`.
const CURRENT_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed article repository.
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// Operations run under `tokio::task::spawn_blocking` so the synchronous
/// rusqlite calls never block the async runtime.
pub struct SqliteRepository {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Create a new SQLite repository at the given path.
    ///
    /// Creates the database file and schema if they don't exist and runs
    /// any pending migrations. The connection is configured with WAL
    /// journaling, full synchronous durability, and a busy timeout.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        let conn = Connection::open(path_ref)
            .map_err(|e| RepositoryError::storage("open database", e.to_string()))?;

        let is_in_memory = path_str == ":memory:";
        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| RepositoryError::storage("set journal_mode", e.to_string()))?;

        let journal_mode_ok = journal_mode.eq_ignore_ascii_case("wal")
            || (is_in_memory && journal_mode.eq_ignore_ascii_case("memory"));

        if !journal_mode_ok {
            return Err(RepositoryError::storage(
                "configure journal_mode",
                format!(
                    "Failed to enable WAL mode: SQLite returned '{}' instead of 'wal'",
                    journal_mode
                ),
            ));
        }

        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .map_err(|e| RepositoryError::storage("configure pragmas", e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("create schema_version table", e.to_string()))?;

        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory repository (for testing).
    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        Self::new(":memory:")
    }

    /// Run migrations from `from_version` to `CURRENT_SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), RepositoryError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::storage(
                "schema version",
                format!(
                    "Database schema version {} is newer than supported version {}",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version < 1 {
            Self::migrate_v0_to_v1(conn)?;
        }

        // Future migrations go here:
        // if from_version < 2 {
        //     Self::migrate_v1_to_v2(conn)?;
        // }

        conn.execute(
            "INSERT INTO schema_version (id, version) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET version = ?1",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| RepositoryError::storage("update schema version", e.to_string()))?;

        Ok(())
    }

    /// Migration v0 -> v1: initial schema.
    fn migrate_v0_to_v1(conn: &Connection) -> Result<(), RepositoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS news_article (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id TEXT NOT NULL UNIQUE,
                canonical_id TEXT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                language TEXT NOT NULL,
                categories TEXT NOT NULL,
                keywords TEXT NOT NULL,
                contacts TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('pending', 'published', 'rejected')),
                revision_count INTEGER NOT NULL DEFAULT 0,
                required_corrections INTEGER NOT NULL DEFAULT 0,
                embedding TEXT,
                published_at TEXT,
                rejected_at TEXT
            );

            CREATE TABLE IF NOT EXISTS verdict_audit (
                article_ref INTEGER PRIMARY KEY REFERENCES news_article(id),
                status TEXT NOT NULL,
                editorial_decision TEXT,
                editorial_warning TEXT,
                explanation TEXT NOT NULL,
                checked_criteria TEXT NOT NULL,
                failed_criteria TEXT NOT NULL,
                reconsideration TEXT,
                interview_needed INTEGER NOT NULL,
                interview_method TEXT NOT NULL,
                interview_areas TEXT NOT NULL,
                interview_focus TEXT NOT NULL,
                interview_justification TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit_issue (
                article_ref INTEGER NOT NULL REFERENCES news_article(id),
                position INTEGER NOT NULL,
                issue_type TEXT NOT NULL,
                location TEXT NOT NULL,
                description TEXT NOT NULL,
                suggestion TEXT NOT NULL,
                PRIMARY KEY (article_ref, position)
            );

            CREATE TABLE IF NOT EXISTS audit_reasoning (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_ref INTEGER NOT NULL REFERENCES news_article(id),
                cycle INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('initial', 'reconsideration')),
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_reasoning_article
                ON audit_reasoning(article_ref, cycle);

            CREATE TABLE IF NOT EXISTS interview_dispatch (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_ref INTEGER NOT NULL REFERENCES news_article(id),
                channel TEXT NOT NULL CHECK(channel IN ('email', 'phone')),
                tracking_handle TEXT NOT NULL UNIQUE,
                dispatched_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("create initial schema", e.to_string()))?;

        Ok(())
    }
}

fn json_vec(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn parse_json_vec(text: &str) -> Vec<String> {
    serde_json::from_str(text).unwrap_or_default()
}

fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    let status_text: String = row.get("status")?;
    let categories: String = row.get("categories")?;
    let keywords: String = row.get("keywords")?;
    let contacts: String = row.get("contacts")?;
    let canonical: Option<String> = row.get("canonical_id")?;
    let required: i64 = row.get("required_corrections")?;

    Ok(Article {
        id: ArticleId(row.get("article_id")?),
        canonical_id: canonical.map(CanonicalNewsId),
        storage_id: Some(StorageId(row.get("id")?)),
        title: row.get("title")?,
        content: row.get("content")?,
        language: row.get("language")?,
        categories: parse_json_vec(&categories),
        keywords: parse_json_vec(&keywords),
        contacts: serde_json::from_str(&contacts).unwrap_or_default(),
        revision_count: row.get::<_, i64>("revision_count")? as u32,
        required_corrections: required != 0,
        status: ArticleStatus::parse(&status_text).unwrap_or(ArticleStatus::Pending),
    })
}

fn read_status(conn: &Connection, id: StorageId) -> Result<ArticleStatus, RepositoryError> {
    let status_text: Option<String> = conn
        .query_row(
            "SELECT status FROM news_article WHERE id = ?1",
            params![id.0],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| RepositoryError::storage("read status", e.to_string()))?;

    let status_text = status_text.ok_or_else(|| RepositoryError::not_found(id))?;
    ArticleStatus::parse(&status_text).ok_or_else(|| {
        RepositoryError::storage("read status", format!("unknown status '{}'", status_text))
    })
}

#[async_trait]
impl ArticleRepository for SqliteRepository {
    async fn upsert_article(&self, article: &Article) -> Result<StorageId, RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let article = article.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");

            let contacts = serde_json::to_string(&article.contacts)
                .map_err(|e| RepositoryError::storage("serialize contacts", e.to_string()))?;

            if let Some(id) = article.storage_id {
                let updated = conn
                    .execute(
                        "UPDATE news_article
                         SET article_id = ?1, canonical_id = ?2, title = ?3, content = ?4,
                             language = ?5, categories = ?6, keywords = ?7, contacts = ?8,
                             status = ?9, revision_count = ?10, required_corrections = ?11
                         WHERE id = ?12",
                        params![
                            article.id.0,
                            article.canonical_id.as_ref().map(|c| c.0.clone()),
                            article.title,
                            article.content,
                            article.language,
                            json_vec(&article.categories),
                            json_vec(&article.keywords),
                            contacts,
                            article.status.as_str(),
                            article.revision_count as i64,
                            article.required_corrections as i64,
                            id.0,
                        ],
                    )
                    .map_err(|e| RepositoryError::storage("update article", e.to_string()))?;

                if updated == 0 {
                    return Err(RepositoryError::not_found(id));
                }
                return Ok(id);
            }

            conn.execute(
                "INSERT INTO news_article
                 (article_id, canonical_id, title, content, language, categories, keywords,
                  contacts, status, revision_count, required_corrections)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    article.id.0,
                    article.canonical_id.as_ref().map(|c| c.0.clone()),
                    article.title,
                    article.content,
                    article.language,
                    json_vec(&article.categories),
                    json_vec(&article.keywords),
                    contacts,
                    article.status.as_str(),
                    article.revision_count as i64,
                    article.required_corrections as i64,
                ],
            )
            .map_err(|e| RepositoryError::storage("insert article", e.to_string()))?;

            Ok(StorageId(conn.last_insert_rowid()))
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn get_article(&self, id: StorageId) -> Result<Option<Article>, RepositoryError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            conn.query_row(
                "SELECT * FROM news_article WHERE id = ?1",
                params![id.0],
                row_to_article,
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get article", e.to_string()))
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn revision_count(&self, id: StorageId) -> Result<u32, RepositoryError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            let count: Option<i64> = conn
                .query_row(
                    "SELECT revision_count FROM news_article WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| RepositoryError::storage("read revision count", e.to_string()))?;

            count
                .map(|c| c as u32)
                .ok_or_else(|| RepositoryError::not_found(id))
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn update_revision(
        &self,
        id: StorageId,
        title: &str,
        content: &str,
        revision_count: u32,
        required_corrections: bool,
    ) -> Result<(), RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let title = title.to_string();
        let content = content.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            let updated = conn
                .execute(
                    "UPDATE news_article
                     SET title = ?1, content = ?2, revision_count = ?3, required_corrections = ?4
                     WHERE id = ?5",
                    params![
                        title,
                        content,
                        revision_count as i64,
                        required_corrections as i64,
                        id.0
                    ],
                )
                .map_err(|e| RepositoryError::storage("update revision", e.to_string()))?;

            if updated == 0 {
                return Err(RepositoryError::not_found(id));
            }
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn publish(
        &self,
        id: StorageId,
        embedding: &[f32],
        published_at: DateTime<Utc>,
    ) -> Result<PublishWrite, RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let embedding = serde_json::to_string(embedding)
            .map_err(|e| RepositoryError::storage("serialize embedding", e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().expect("mutex poisoned");
            // Status, embedding, and timestamp move together or not at all.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| RepositoryError::storage("begin publish transaction", e.to_string()))?;

            match read_status(&tx, id)? {
                ArticleStatus::Published => return Ok(PublishWrite::AlreadyPublished),
                ArticleStatus::Rejected => {
                    return Err(RepositoryError::invalid_status("publish", "rejected"))
                }
                ArticleStatus::Pending => {}
            }

            tx.execute(
                "UPDATE news_article
                 SET status = 'published', embedding = ?1, published_at = ?2
                 WHERE id = ?3",
                params![embedding, published_at.to_rfc3339(), id.0],
            )
            .map_err(|e| RepositoryError::storage("publish article", e.to_string()))?;

            tx.commit()
                .map_err(|e| RepositoryError::storage("commit publish", e.to_string()))?;

            Ok(PublishWrite::Applied)
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn reject(
        &self,
        id: StorageId,
        rejected_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().expect("mutex poisoned");
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| RepositoryError::storage("begin reject transaction", e.to_string()))?;

            match read_status(&tx, id)? {
                ArticleStatus::Published => {
                    return Err(RepositoryError::invalid_status("reject", "published"))
                }
                ArticleStatus::Rejected => return Ok(()),
                ArticleStatus::Pending => {}
            }

            tx.execute(
                "UPDATE news_article SET status = 'rejected', rejected_at = ?1 WHERE id = ?2",
                params![rejected_at.to_rfc3339(), id.0],
            )
            .map_err(|e| RepositoryError::storage("reject article", e.to_string()))?;

            tx.commit()
                .map_err(|e| RepositoryError::storage("commit reject", e.to_string()))?;

            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn save_verdict(
        &self,
        id: StorageId,
        verdict: &Verdict,
        cycle: u32,
    ) -> Result<(), RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let verdict = verdict.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().expect("mutex poisoned");
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| RepositoryError::storage("begin audit transaction", e.to_string()))?;

            // Guard against dangling audit rows for unknown articles.
            read_status(&tx, id)?;

            let now = Utc::now().to_rfc3339();

            tx.execute(
                "INSERT INTO verdict_audit
                 (article_ref, status, editorial_decision, editorial_warning, explanation,
                  checked_criteria, failed_criteria, reconsideration, interview_needed,
                  interview_method, interview_areas, interview_focus, interview_justification,
                  updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(article_ref) DO UPDATE SET
                     status = ?2, editorial_decision = ?3, editorial_warning = ?4,
                     explanation = ?5, checked_criteria = ?6, failed_criteria = ?7,
                     reconsideration = ?8, interview_needed = ?9, interview_method = ?10,
                     interview_areas = ?11, interview_focus = ?12,
                     interview_justification = ?13, updated_at = ?14",
                params![
                    id.0,
                    verdict.status.as_str(),
                    verdict.editorial_decision.map(|d| d.as_str()),
                    verdict.editorial_warning,
                    verdict.reasoning.explanation,
                    json_vec(&verdict.reasoning.checked_criteria),
                    json_vec(&verdict.reasoning.failed_criteria),
                    verdict.reasoning.reconsideration,
                    verdict.interview_decision.needed as i64,
                    verdict.interview_decision.method.as_str(),
                    json_vec(&verdict.interview_decision.target_expertise_areas),
                    verdict.interview_decision.focus,
                    verdict.interview_decision.justification,
                    now,
                ],
            )
            .map_err(|e| RepositoryError::storage("save verdict", e.to_string()))?;

            tx.execute(
                "DELETE FROM audit_issue WHERE article_ref = ?1",
                params![id.0],
            )
            .map_err(|e| RepositoryError::storage("clear audit issues", e.to_string()))?;

            for (position, issue) in verdict.issues.iter().enumerate() {
                tx.execute(
                    "INSERT INTO audit_issue
                     (article_ref, position, issue_type, location, description, suggestion)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        id.0,
                        position as i64,
                        issue.kind,
                        issue.location,
                        issue.description,
                        issue.suggestion
                    ],
                )
                .map_err(|e| RepositoryError::storage("save audit issue", e.to_string()))?;
            }

            // Replace this cycle's steps; earlier cycles are kept.
            tx.execute(
                "DELETE FROM audit_reasoning WHERE article_ref = ?1 AND cycle = ?2",
                params![id.0, cycle as i64],
            )
            .map_err(|e| RepositoryError::storage("clear cycle reasoning", e.to_string()))?;

            if !verdict.reasoning.explanation.is_empty() {
                tx.execute(
                    "INSERT INTO audit_reasoning (article_ref, cycle, kind, body, created_at)
                     VALUES (?1, ?2, 'initial', ?3, ?4)",
                    params![id.0, cycle as i64, verdict.reasoning.explanation, now],
                )
                .map_err(|e| RepositoryError::storage("save reasoning", e.to_string()))?;
            }

            if let Some(reconsideration) = &verdict.reasoning.reconsideration {
                tx.execute(
                    "INSERT INTO audit_reasoning (article_ref, cycle, kind, body, created_at)
                     VALUES (?1, ?2, 'reconsideration', ?3, ?4)",
                    params![id.0, cycle as i64, reconsideration, now],
                )
                .map_err(|e| RepositoryError::storage("save reconsideration", e.to_string()))?;
            }

            tx.commit()
                .map_err(|e| RepositoryError::storage("commit audit", e.to_string()))?;

            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn load_verdict(&self, id: StorageId) -> Result<Option<Verdict>, RepositoryError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");

            let row = conn
                .query_row(
                    "SELECT status, editorial_decision, editorial_warning, explanation,
                            checked_criteria, failed_criteria, reconsideration,
                            interview_needed, interview_method, interview_areas,
                            interview_focus, interview_justification
                     FROM verdict_audit WHERE article_ref = ?1",
                    params![id.0],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, Option<String>>(6)?,
                            row.get::<_, i64>(7)?,
                            row.get::<_, String>(8)?,
                            row.get::<_, String>(9)?,
                            row.get::<_, String>(10)?,
                            row.get::<_, String>(11)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| RepositoryError::storage("load verdict", e.to_string()))?;

            let Some((
                status,
                decision,
                warning,
                explanation,
                checked,
                failed,
                reconsideration,
                needed,
                method,
                areas,
                focus,
                justification,
            )) = row
            else {
                return Ok(None);
            };

            let mut stmt = conn
                .prepare(
                    "SELECT issue_type, location, description, suggestion
                     FROM audit_issue WHERE article_ref = ?1 ORDER BY position",
                )
                .map_err(|e| RepositoryError::storage("prepare issue query", e.to_string()))?;

            let issues = stmt
                .query_map(params![id.0], |row| {
                    Ok(ReviewIssue {
                        kind: row.get(0)?,
                        location: row.get(1)?,
                        description: row.get(2)?,
                        suggestion: row.get(3)?,
                    })
                })
                .map_err(|e| RepositoryError::storage("load audit issues", e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| RepositoryError::storage("load audit issues", e.to_string()))?;

            Ok(Some(Verdict {
                status: VerdictStatus::parse(&status).unwrap_or(VerdictStatus::IssuesFound),
                issues,
                reasoning: Reasoning {
                    checked_criteria: parse_json_vec(&checked),
                    failed_criteria: parse_json_vec(&failed),
                    explanation,
                    reconsideration,
                },
                interview_decision: InterviewDecision {
                    needed: needed != 0,
                    method: InterviewMethod::parse(&method).unwrap_or(InterviewMethod::None),
                    target_expertise_areas: parse_json_vec(&areas),
                    focus,
                    justification,
                },
                editorial_decision: decision.as_deref().and_then(EditorialDecision::parse),
                editorial_warning: warning,
            }))
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn reasoning_trail(
        &self,
        id: StorageId,
    ) -> Result<Vec<ReasoningStep>, RepositoryError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");

            let mut stmt = conn
                .prepare(
                    "SELECT cycle, kind, body FROM audit_reasoning
                     WHERE article_ref = ?1 ORDER BY cycle, id",
                )
                .map_err(|e| RepositoryError::storage("prepare reasoning query", e.to_string()))?;

            let steps = stmt
                .query_map(params![id.0], |row| {
                    let cycle: i64 = row.get(0)?;
                    let kind: String = row.get(1)?;
                    let body: String = row.get(2)?;
                    Ok((cycle, kind, body))
                })
                .map_err(|e| RepositoryError::storage("load reasoning trail", e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| RepositoryError::storage("load reasoning trail", e.to_string()))?;

            Ok(steps
                .into_iter()
                .map(|(cycle, kind, body)| ReasoningStep {
                    cycle: cycle as u32,
                    kind: ReasoningKind::parse(&kind).unwrap_or(ReasoningKind::Initial),
                    body,
                })
                .collect())
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn record_interview(
        &self,
        id: StorageId,
        channel: InterviewChannel,
        tracking_handle: &str,
        dispatched_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let tracking_handle = tracking_handle.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            conn.execute(
                "INSERT INTO interview_dispatch (article_ref, channel, tracking_handle, dispatched_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id.0,
                    channel.as_str(),
                    tracking_handle,
                    dispatched_at.to_rfc3339()
                ],
            )
            .map_err(|e| RepositoryError::storage("record interview", e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }

    async fn find_article_by_tracking_handle(
        &self,
        tracking_handle: &str,
    ) -> Result<Option<StorageId>, RepositoryError> {
        let conn = Arc::clone(&self.conn);
        let tracking_handle = tracking_handle.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            conn.query_row(
                "SELECT article_ref FROM interview_dispatch WHERE tracking_handle = ?1",
                params![tracking_handle],
                |row| row.get::<_, i64>(0).map(StorageId),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("find tracking handle", e.to_string()))
        })
        .await
        .map_err(|e| RepositoryError::storage("join blocking task", e.to_string()))?
    }
}
