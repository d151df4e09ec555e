//! The bounded revision loop.
//!
//! One cycle formats the current issues into a correction request, invokes
//! the reviser, extracts the rewritten title and content, mutates the
//! article, persists it, and re-checks the *original* issue list with the
//! fix validator. The validator's contract is deliberately narrower than a
//! fresh full review: it verifies the named issues and hunts for nothing new.
//!
//! Failure semantics: a collaborator invocation failure is folded into a
//! deterministic rejecting verdict so the caller is never left without one;
//! an extraction failure aborts the cycle without consuming a revision
//! attempt and without touching the article.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use newsdesk_core::article::Article;
use newsdesk_core::parse::{extract_revision, ExtractionError};
use newsdesk_core::verdict::Verdict;

use crate::collaborators::{call_with_timeout, CorrectionRequest, FixValidator, Reviser};
use crate::repository::{ArticleRepository, RepositoryError};

/// Why a revision cycle was aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionError {
    /// The reviser's response could not be parsed into title and content.
    /// The article is unchanged and no revision attempt was consumed.
    Extraction(ExtractionError),
    /// The revised article could not be persisted. The in-memory mutation
    /// was rolled back so the persisted state stays authoritative.
    Persistence(RepositoryError),
}

impl fmt::Display for RevisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(e) => write!(f, "revision extraction failed: {}", e),
            Self::Persistence(e) => write!(f, "revision persistence failed: {}", e),
        }
    }
}

impl std::error::Error for RevisionError {}

/// Executes one Reviser + Fix Validator cycle.
pub struct RevisionCycle<'a> {
    reviser: &'a dyn Reviser,
    validator: &'a dyn FixValidator,
    repository: &'a dyn ArticleRepository,
    timeout: Duration,
}

impl<'a> RevisionCycle<'a> {
    pub fn new(
        reviser: &'a dyn Reviser,
        validator: &'a dyn FixValidator,
        repository: &'a dyn ArticleRepository,
        timeout: Duration,
    ) -> Self {
        Self {
            reviser,
            validator,
            repository,
            timeout,
        }
    }

    /// Run one revision cycle and return the verdict to feed back into the
    /// decision router.
    pub async fn run(
        &self,
        article: &mut Article,
        verdict: &Verdict,
    ) -> Result<Verdict, RevisionError> {
        let request = CorrectionRequest {
            title: article.title.clone(),
            content: article.content.clone(),
            issues: verdict.issues.clone(),
            feedback: verdict.reasoning.explanation.clone(),
            context: correction_context(verdict),
        };

        info!(
            "Starting revision cycle {} for article {} ({} issues)",
            article.revision_count + 1,
            article.id,
            request.issues.len()
        );

        let response = match call_with_timeout(
            self.timeout,
            "content revision",
            self.reviser.revise(&request),
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Reviser failed for article {}: {}", article.id, e);
                return Ok(Verdict::technical_failure(
                    "content revision",
                    &e.to_string(),
                ));
            }
        };

        let revised = extract_revision(&response).map_err(RevisionError::Extraction)?;

        let previous_title = article.title.clone();
        let previous_content = article.content.clone();
        let previous_count = article.revision_count;
        let previous_required = article.required_corrections;

        article.apply_revision(revised.title, revised.content);

        if let Some(storage_id) = article.storage_id {
            if let Err(e) = self
                .repository
                .update_revision(
                    storage_id,
                    &article.title,
                    &article.content,
                    article.revision_count,
                    article.required_corrections,
                )
                .await
            {
                article.title = previous_title;
                article.content = previous_content;
                article.revision_count = previous_count;
                article.required_corrections = previous_required;
                return Err(RevisionError::Persistence(e));
            }
        } else {
            warn!(
                "Article {} has no storage identity; revision kept in memory only",
                article.id
            );
        }

        // Validate the original issue list against the revised text.
        let validation = match call_with_timeout(
            self.timeout,
            "fix validation",
            self.validator
                .validate(&verdict.issues, &article.title, &article.content),
        )
        .await
        {
            Ok(validation) => validation,
            Err(e) => {
                warn!("Fix validator failed for article {}: {}", article.id, e);
                return Ok(Verdict::technical_failure("fix validation", &e.to_string()));
            }
        };

        info!(
            "Revision cycle {} for article {}: all_fixes_verified={}, remaining={}",
            article.revision_count,
            article.id,
            validation.all_fixes_verified,
            validation.remaining_issues.len()
        );

        Ok(Verdict::from_validation(&validation, article.revision_count))
    }
}

/// Collect the optional context threaded through to the reviser.
fn correction_context(verdict: &Verdict) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(reconsideration) = &verdict.reasoning.reconsideration {
        parts.push(format!("Reconsideration: {}", reconsideration));
    }
    if verdict.interview_decision.needed && !verdict.interview_decision.justification.is_empty() {
        parts.push(format!(
            "Interview context: {}",
            verdict.interview_decision.justification
        ));
    }
    if let Some(warning) = &verdict.editorial_warning {
        parts.push(format!("Editorial warning: {}", warning));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
