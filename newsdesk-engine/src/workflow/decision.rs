//! Pure decision routing.
//!
//! The router is the single entry point after every verdict is produced,
//! whether from the initial review or a post-revision validation. It only
//! classifies; all mutation happens in the handlers it dispatches to. Given
//! a verdict and the article's current revision count it returns exactly one
//! next action together with the (possibly rewritten) verdict to persist.

use std::fmt;

use newsdesk_core::verdict::{
    EditorialDecision, ReviewIssue, Verdict, VerdictStatus, MAX_REVISION_CYCLES,
};

/// The one action the workflow takes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Publish,
    Interview,
    Revise,
    Reject,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => write!(f, "publish"),
            Self::Interview => write!(f, "interview"),
            Self::Revise => write!(f, "revise"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Result of routing a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedDecision {
    pub action: NextAction,
    /// The verdict to persist, rewritten where a rule demands it.
    pub verdict: Verdict,
}

/// Route a verdict to the next action.
///
/// Rules, evaluated in order:
/// 1. An explicit judge-issued `reject` is final and is never converted
///    into a revision attempt.
/// 2. Empty issues and empty failed criteria mean publish, regardless of
///    the verdict's own recommendation; an unset recommendation defaults
///    to publish.
/// 3. Failed criteria without located issues synthesize one issue per
///    criterion and route to revise, giving the reviser one explicit
///    attempt rather than rejecting on vague criteria alone.
/// 4. With issues present, an interview (when requested) is attempted
///    before a revision attempt is consumed, since it changes the evidence
///    available to the reviser.
/// 5. Whenever a revise decision would be taken with `revision_count`
///    already at the bound, the action is forced to reject and the verdict
///    is replaced with the automatic revision-limit explanation. This rule
///    is absolute and cannot be overridden by the verdict's own
///    recommendation.
pub fn route(verdict: Verdict, revision_count: u32) -> RoutedDecision {
    // An explicit judge-issued rejection is final.
    if verdict.editorial_decision == Some(EditorialDecision::Reject) {
        return RoutedDecision {
            action: NextAction::Reject,
            verdict,
        };
    }

    // Nothing to fix and no criterion-level failures: publish.
    if verdict.clean() {
        let mut verdict = verdict;
        if verdict.editorial_decision.is_none() {
            verdict.editorial_decision = Some(EditorialDecision::Publish);
        }
        return RoutedDecision {
            action: NextAction::Publish,
            verdict,
        };
    }

    // Criterion-level failure without located issues: synthesize one issue
    // per failed criterion and hand the reviser an explicit attempt.
    if verdict.issues.is_empty() {
        let mut verdict = verdict;
        verdict.issues = verdict
            .reasoning
            .failed_criteria
            .iter()
            .map(|criterion| {
                ReviewIssue::article_wide(
                    "Criterion",
                    format!("Failed criteria: {}", criterion),
                )
            })
            .collect();
        verdict.status = VerdictStatus::IssuesFound;
        return revise_or_force_reject(verdict, revision_count);
    }

    // Issues present: interview first when requested, otherwise revise.
    if verdict.interview_decision.needed {
        let mut verdict = verdict;
        verdict.editorial_decision = Some(EditorialDecision::Interview);
        return RoutedDecision {
            action: NextAction::Interview,
            verdict,
        };
    }

    revise_or_force_reject(verdict, revision_count)
}

/// Apply the revision-count bound to a revise-shaped verdict.
fn revise_or_force_reject(verdict: Verdict, revision_count: u32) -> RoutedDecision {
    if revision_count >= MAX_REVISION_CYCLES {
        return RoutedDecision {
            action: NextAction::Reject,
            verdict: Verdict::revision_limit_exceeded(revision_count),
        };
    }

    let mut verdict = verdict;
    verdict.editorial_decision = Some(EditorialDecision::Revise);
    RoutedDecision {
        action: NextAction::Revise,
        verdict,
    }
}
