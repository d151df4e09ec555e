//! The workflow engine.
//!
//! `Workflow::process` is the orchestrator-facing entry point: it takes an
//! article and a verdict already in hand (the engine never calls the editor
//! itself) and loops the verdict through the decision router until a
//! terminal outcome or an interview hand-off. Every invocation returns
//! either a terminal handler's result or a next-action with its verdict,
//! never "no decision".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use newsdesk_core::article::{Article, ArticleId, StorageId};
use newsdesk_core::verdict::Verdict;

use newsdesk_core::llm::{ChatClient, EmbeddingClient};

use super::decision::{route, NextAction};
use super::interview::{InterviewError, InterviewRouter};
use super::revision::{RevisionCycle, RevisionError};
use super::terminal::{self, PublishOutcome, RejectOutcome, TerminalError};
use crate::collaborators::{
    Embedder, FixValidator, LlmEditor, LlmEmbedder, LlmFixValidator, LlmQuestionWriter,
    LlmReviser, QuestionWriter, Reviser,
};
use crate::config::Config;
use crate::dispatch::{
    CallServiceClient, DispatchReceipt, DualChannelDispatcher, InterviewDispatcher,
    InterviewReply, MailRelayClient,
};
use crate::repository::{ArticleRepository, RepositoryError, SqliteRepository};

/// Terminal result of one workflow invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    Published {
        outcome: PublishOutcome,
        verdict: Verdict,
    },
    Rejected {
        outcome: RejectOutcome,
        verdict: Verdict,
    },
    /// An interview was dispatched; the article stays pending until the
    /// reply re-enters the workflow.
    AwaitingReply {
        receipt: DispatchReceipt,
        verdict: Verdict,
    },
}

/// Why a workflow invocation stopped without an outcome.
#[derive(Debug)]
pub enum WorkflowError {
    Revision(RevisionError),
    Interview(InterviewError),
    Terminal(TerminalError),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revision(e) => write!(f, "{}", e),
            Self::Interview(e) => write!(f, "{}", e),
            Self::Terminal(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WorkflowError {}

/// The editorial workflow over injected collaborators and storage.
pub struct Workflow {
    repository: Arc<dyn ArticleRepository>,
    reviser: Arc<dyn Reviser>,
    fix_validator: Arc<dyn FixValidator>,
    question_writer: Arc<dyn QuestionWriter>,
    dispatcher: Arc<dyn InterviewDispatcher>,
    embedder: Arc<dyn Embedder>,
    collaborator_timeout: Duration,
    /// Per-article guards: the revision-count invariant is not safe under
    /// concurrent increments for the same article. Distinct articles
    /// proceed concurrently.
    article_locks: Mutex<HashMap<ArticleId, Arc<Mutex<()>>>>,
}

impl Workflow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn ArticleRepository>,
        reviser: Arc<dyn Reviser>,
        fix_validator: Arc<dyn FixValidator>,
        question_writer: Arc<dyn QuestionWriter>,
        dispatcher: Arc<dyn InterviewDispatcher>,
        embedder: Arc<dyn Embedder>,
        collaborator_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            reviser,
            fix_validator,
            question_writer,
            dispatcher,
            embedder,
            collaborator_timeout,
            article_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wire the production collaborators and SQLite storage from
    /// configuration.
    pub fn from_config(config: &Config) -> Result<Self, RepositoryError> {
        let repository = Arc::new(SqliteRepository::new(&config.database_path)?);

        let chat = ChatClient::new(
            config.llm_api_key.clone(),
            config.llm_base_url.clone(),
            config.llm_model.clone(),
        );
        let embeddings = EmbeddingClient::new(
            config.llm_api_key.clone(),
            config.llm_base_url.clone(),
            config.embedding_model.clone(),
        );
        let dispatcher = DualChannelDispatcher::new(
            MailRelayClient::new(
                config.mail_relay_url.clone(),
                config.mail_relay_token.clone(),
                config.interview_from_address.clone(),
            ),
            CallServiceClient::new(
                config.call_service_url.clone(),
                config.call_service_token.clone(),
            ),
        );

        Ok(Self::new(
            repository,
            Arc::new(LlmReviser::new(chat.clone())),
            Arc::new(LlmFixValidator::new(chat.clone())),
            Arc::new(LlmQuestionWriter::new(chat)),
            Arc::new(dispatcher),
            Arc::new(LlmEmbedder::new(embeddings)),
            Duration::from_secs(config.collaborator_timeout_secs),
        ))
    }

    /// The production editor the orchestrator runs (via
    /// `collaborators::verdict_or_reject`) before entering the router.
    pub fn editor_from_config(config: &Config) -> LlmEditor {
        LlmEditor::new(ChatClient::new(
            config.llm_api_key.clone(),
            config.llm_base_url.clone(),
            config.llm_model.clone(),
        ))
    }

    async fn lock_for(&self, id: &ArticleId) -> Arc<Mutex<()>> {
        let mut locks = self.article_locks.lock().await;
        locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drive one article from a verdict to a terminal outcome or an
    /// interview hand-off.
    ///
    /// Re-entry after an interview reply uses this same method: the
    /// orchestrator re-enriches the article, produces a verdict for it, and
    /// calls `process` again. No full editor re-review is forced here; that
    /// is a policy decision left with the caller.
    pub async fn process(
        &self,
        article: &mut Article,
        verdict: Verdict,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let article_lock = self.lock_for(&article.id).await;
        let _guard = article_lock.lock().await;

        let mut verdict = verdict;

        loop {
            self.refresh_revision_count(article).await;

            let routed = route(verdict, article.revision_count);
            info!(
                "Article {} (revisions: {}): routed to {} ({})",
                article.id,
                article.revision_count,
                routed.action,
                routed.verdict.log_summary()
            );

            self.persist_verdict(article, &routed.verdict).await;

            match routed.action {
                NextAction::Publish => {
                    let outcome = terminal::publish(
                        self.repository.as_ref(),
                        self.embedder.as_ref(),
                        article,
                        self.collaborator_timeout,
                    )
                    .await
                    .map_err(WorkflowError::Terminal)?;

                    return Ok(WorkflowOutcome::Published {
                        outcome,
                        verdict: routed.verdict,
                    });
                }

                NextAction::Reject => {
                    let outcome = terminal::reject(
                        self.repository.as_ref(),
                        article,
                        &routed.verdict,
                        article.revision_count,
                    )
                    .await
                    .map_err(WorkflowError::Terminal)?;

                    return Ok(WorkflowOutcome::Rejected {
                        outcome,
                        verdict: routed.verdict,
                    });
                }

                NextAction::Interview => {
                    let router = InterviewRouter::new(
                        self.question_writer.as_ref(),
                        self.dispatcher.as_ref(),
                        self.repository.as_ref(),
                        self.collaborator_timeout,
                    );
                    let receipt = router
                        .run(article, &routed.verdict)
                        .await
                        .map_err(WorkflowError::Interview)?;

                    return Ok(WorkflowOutcome::AwaitingReply {
                        receipt,
                        verdict: routed.verdict,
                    });
                }

                NextAction::Revise => {
                    let cycle = RevisionCycle::new(
                        self.reviser.as_ref(),
                        self.fix_validator.as_ref(),
                        self.repository.as_ref(),
                        self.collaborator_timeout,
                    );
                    verdict = cycle
                        .run(article, &routed.verdict)
                        .await
                        .map_err(WorkflowError::Revision)?;
                }
            }
        }
    }

    /// Resolve an interview reply's tracking handle back to its article.
    ///
    /// The reply content itself is handed to re-enrichment outside this
    /// core; once re-enrichment produced a fresh verdict, the orchestrator
    /// re-enters [`Workflow::process`].
    pub async fn correlate_reply(
        &self,
        reply: &InterviewReply,
    ) -> Result<Option<StorageId>, RepositoryError> {
        self.repository
            .find_article_by_tracking_handle(&reply.tracking_handle)
            .await
    }

    /// Re-read the persisted revision count so the bound is enforced
    /// against the most recently persisted value, not a stale in-memory
    /// copy.
    async fn refresh_revision_count(&self, article: &mut Article) {
        let Some(storage_id) = article.storage_id else {
            return;
        };
        match self.repository.revision_count(storage_id).await {
            Ok(count) => article.revision_count = count,
            Err(e) => {
                warn!(
                    "Could not refresh revision count for article {} ({}): {}",
                    article.id, storage_id, e
                );
            }
        }
    }

    async fn persist_verdict(&self, article: &Article, verdict: &Verdict) {
        let Some(storage_id) = article.storage_id else {
            return;
        };
        if let Err(e) = self
            .repository
            .save_verdict(storage_id, verdict, article.revision_count)
            .await
        {
            warn!(
                "Could not persist verdict for article {} ({}): {}",
                article.id, storage_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ArticleRepository, InMemoryRepository};
    use crate::test_support::{
        FakeDispatcher, FakeEmbedder, FakeQuestionWriter, FakeReviser, FakeValidator,
    };
    use newsdesk_core::article::{ArticleStatus, Contact};
    use newsdesk_core::parse::ExtractionError;
    use newsdesk_core::verdict::{
        EditorialDecision, InterviewDecision, InterviewMethod, Reasoning, ReviewIssue,
        ValidationResult, VerdictStatus,
    };

    struct Harness {
        repo: Arc<InMemoryRepository>,
        reviser: Arc<FakeReviser>,
        validator: Arc<FakeValidator>,
        question_writer: Arc<FakeQuestionWriter>,
        dispatcher: Arc<FakeDispatcher>,
    }

    impl Harness {
        fn new(
            reviser: FakeReviser,
            validator: FakeValidator,
        ) -> (Self, Workflow) {
            let repo = Arc::new(InMemoryRepository::new());
            let reviser = Arc::new(reviser);
            let validator = Arc::new(validator);
            let question_writer = Arc::new(FakeQuestionWriter::with_questions(vec![
                "Q1?".to_string(),
                "Q2?".to_string(),
            ]));
            let dispatcher = Arc::new(FakeDispatcher::succeeding());

            let workflow = Workflow::new(
                repo.clone(),
                reviser.clone(),
                validator.clone(),
                question_writer.clone(),
                dispatcher.clone(),
                Arc::new(FakeEmbedder::with_dimension(3)),
                Duration::from_secs(5),
            );

            (
                Self {
                    repo,
                    reviser,
                    validator,
                    question_writer,
                    dispatcher,
                },
                workflow,
            )
        }
    }

    fn clean_verdict() -> Verdict {
        Verdict {
            status: VerdictStatus::Ok,
            issues: Vec::new(),
            reasoning: Reasoning::default(),
            interview_decision: InterviewDecision::not_needed(),
            editorial_decision: None,
            editorial_warning: None,
        }
    }

    fn issue_verdict() -> Verdict {
        Verdict {
            status: VerdictStatus::IssuesFound,
            issues: vec![ReviewIssue {
                kind: "Legal".to_string(),
                location: "Paragraph 2".to_string(),
                description: "Allegation stated as fact".to_string(),
                suggestion: "Attribute it".to_string(),
            }],
            reasoning: Reasoning {
                checked_criteria: vec!["legal".to_string()],
                failed_criteria: vec!["legal".to_string()],
                explanation: "Initial review found a legal issue".to_string(),
                reconsideration: None,
            },
            interview_decision: InterviewDecision::not_needed(),
            editorial_decision: Some(EditorialDecision::Revise),
            editorial_warning: None,
        }
    }

    async fn stored_article(repo: &InMemoryRepository) -> Article {
        let mut article = Article::new("a-1", "Headline", "Body");
        article.contacts = vec![Contact {
            name: "Dana Reyes".to_string(),
            title: "Spokesperson".to_string(),
            organization: "City Hall".to_string(),
            email: Some("dana@example.org".to_string()),
            phone: None,
            is_primary: true,
        }];
        let id = repo.upsert_article(&article).await.unwrap();
        article.storage_id = Some(id);
        article
    }

    #[tokio::test]
    async fn test_scenario_a_clean_verdict_publishes() {
        let (harness, workflow) =
            Harness::new(FakeReviser::with_responses(vec![]), FakeValidator::with_results(vec![]));
        let mut article = stored_article(&harness.repo).await;

        let outcome = workflow.process(&mut article, clean_verdict()).await.unwrap();

        assert!(matches!(
            outcome,
            WorkflowOutcome::Published {
                outcome: PublishOutcome::Published { .. },
                ..
            }
        ));
        assert_eq!(article.status, ArticleStatus::Published);
        assert_eq!(article.revision_count, 0);
    }

    #[tokio::test]
    async fn test_scenario_b_revise_then_publish() {
        let reviser = FakeReviser::with_responses(vec![
            "TITLE: Fixed headline\nCONTENT: Fixed body".to_string(),
        ]);
        let validator = FakeValidator::with_results(vec![ValidationResult {
            all_fixes_verified: true,
            remaining_issues: Vec::new(),
            summary: "All issues addressed".to_string(),
        }]);
        let (harness, workflow) = Harness::new(reviser, validator);
        let mut article = stored_article(&harness.repo).await;

        let outcome = workflow.process(&mut article, issue_verdict()).await.unwrap();

        assert!(matches!(outcome, WorkflowOutcome::Published { .. }));
        assert_eq!(article.revision_count, 1);
        assert_eq!(article.title, "Fixed headline");
        assert_eq!(article.status, ArticleStatus::Published);
    }

    #[tokio::test]
    async fn test_scenario_c_two_failed_validations_force_reject() {
        let reviser = FakeReviser::with_responses(vec![
            "TITLE: Attempt one\nCONTENT: Body one".to_string(),
            "TITLE: Attempt two\nCONTENT: Body two".to_string(),
        ]);
        let validator = FakeValidator::with_results(vec![
            ValidationResult {
                all_fixes_verified: false,
                remaining_issues: vec!["Claim still unattributed".to_string()],
                summary: "First validation failed".to_string(),
            },
            ValidationResult {
                all_fixes_verified: false,
                remaining_issues: vec!["Claim still unattributed".to_string()],
                summary: "Second validation failed".to_string(),
            },
        ]);
        let (harness, workflow) = Harness::new(reviser, validator);
        let mut article = stored_article(&harness.repo).await;
        let id = article.storage_id.unwrap();

        let outcome = workflow.process(&mut article, issue_verdict()).await.unwrap();

        let WorkflowOutcome::Rejected { outcome, verdict } = outcome else {
            panic!("expected rejection");
        };
        assert!(outcome.audit_persisted);
        assert_eq!(verdict.editorial_decision, Some(EditorialDecision::Reject));
        assert_eq!(article.revision_count, 2);
        assert_eq!(article.status, ArticleStatus::Rejected);

        // The audit trail holds each cycle's reasoning.
        let trail = harness.repo.reasoning_trail(id).await.unwrap();
        let bodies: Vec<&str> = trail.iter().map(|step| step.body.as_str()).collect();
        assert!(bodies.contains(&"Initial review found a legal issue"));
        assert!(bodies.contains(&"First validation failed"));
        assert!(bodies.contains(&"Second validation failed"));
    }

    #[tokio::test]
    async fn test_interview_hand_off_leaves_article_pending() {
        let (harness, workflow) =
            Harness::new(FakeReviser::with_responses(vec![]), FakeValidator::with_results(vec![]));
        let mut article = stored_article(&harness.repo).await;
        let id = article.storage_id.unwrap();

        let mut verdict = issue_verdict();
        verdict.interview_decision = InterviewDecision {
            needed: true,
            method: InterviewMethod::Email,
            target_expertise_areas: vec!["municipal finance".to_string()],
            focus: "Budget figures".to_string(),
            justification: "Figures conflict".to_string(),
        };

        let outcome = workflow.process(&mut article, verdict).await.unwrap();

        let WorkflowOutcome::AwaitingReply { receipt, .. } = outcome else {
            panic!("expected interview hand-off");
        };
        assert_eq!(article.status, ArticleStatus::Pending);
        assert_eq!(article.revision_count, 0);
        assert_eq!(harness.dispatcher.dispatched_plans().len(), 1);

        // The reply can be correlated back to the article later.
        let reply = InterviewReply {
            tracking_handle: receipt.tracking_handle.clone(),
            content: "The figures come from the draft budget.".to_string(),
        };
        assert_eq!(workflow.correlate_reply(&reply).await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn test_scenario_e_extraction_failure_surfaces_and_preserves_state() {
        let reviser =
            FakeReviser::with_responses(vec!["TITLE: only a title, no body".to_string()]);
        let (harness, workflow) = Harness::new(reviser, FakeValidator::with_results(vec![]));
        let mut article = stored_article(&harness.repo).await;

        let err = workflow.process(&mut article, issue_verdict()).await.unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Revision(RevisionError::Extraction(ExtractionError::MissingContent))
        ));
        assert_eq!(article.revision_count, 0);
        assert_eq!(article.title, "Headline");
        assert_eq!(article.content, "Body");
        assert_eq!(article.status, ArticleStatus::Pending);
    }

    #[tokio::test]
    async fn test_explicit_reject_skips_revision_entirely() {
        let (harness, workflow) =
            Harness::new(FakeReviser::with_responses(vec![]), FakeValidator::with_results(vec![]));
        let mut article = stored_article(&harness.repo).await;

        let mut verdict = issue_verdict();
        verdict.editorial_decision = Some(EditorialDecision::Reject);

        let outcome = workflow.process(&mut article, verdict).await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Rejected { .. }));
        assert_eq!(article.revision_count, 0);
        // No reviser call was consumed.
        assert_eq!(harness.reviser.calls(), 0);
        assert_eq!(harness.validator.calls(), 0);
    }

    #[tokio::test]
    async fn test_resumed_article_uses_persisted_revision_count() {
        let (harness, workflow) =
            Harness::new(FakeReviser::with_responses(vec![]), FakeValidator::with_results(vec![]));
        let mut article = stored_article(&harness.repo).await;
        let id = article.storage_id.unwrap();

        // A previous run already consumed both revision cycles; the
        // in-memory copy is stale.
        harness
            .repo
            .update_revision(id, "Headline", "Body", 2, true)
            .await
            .unwrap();
        article.revision_count = 0;

        let outcome = workflow.process(&mut article, issue_verdict()).await.unwrap();

        assert!(matches!(outcome, WorkflowOutcome::Rejected { .. }));
        assert_eq!(harness.reviser.calls(), 0);
    }

    #[tokio::test]
    async fn test_question_writer_is_not_consulted_without_interview() {
        let reviser = FakeReviser::with_responses(vec![
            "TITLE: Fixed\nCONTENT: Fixed body".to_string(),
        ]);
        let validator = FakeValidator::with_results(vec![ValidationResult {
            all_fixes_verified: true,
            remaining_issues: Vec::new(),
            summary: "Done".to_string(),
        }]);
        let (harness, workflow) = Harness::new(reviser, validator);
        let mut article = stored_article(&harness.repo).await;

        workflow.process(&mut article, issue_verdict()).await.unwrap();
        assert_eq!(harness.question_writer.calls(), 0);
        assert_eq!(harness.dispatcher.dispatched_plans().len(), 0);
    }
}
