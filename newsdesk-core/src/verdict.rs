//! Verdict types produced by the editorial collaborators.
//!
//! A `Verdict` is the structured judgment the Editor (or, after a revision
//! cycle, the Fix Validator translation) hands to the decision router. It is
//! externally produced and consumed once; the router may rewrite it before
//! it is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Completed revision cycles after which any further revise decision is
/// forced into a rejection.
pub const MAX_REVISION_CYCLES: u32 = 2;

/// Overall status of an editorial judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Ok,
    IssuesFound,
    Reconsideration,
}

impl VerdictStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::IssuesFound => "ISSUES_FOUND",
            Self::Reconsideration => "RECONSIDERATION",
        }
    }

    /// Parse from the collaborator's status literal.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OK" => Some(Self::Ok),
            "ISSUES_FOUND" => Some(Self::IssuesFound),
            "RECONSIDERATION" => Some(Self::Reconsideration),
            _ => None,
        }
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The verdict's own routing recommendation.
///
/// The decision router reconciles this with the revision-count bound; the
/// bound can override a `Revise` recommendation into `Reject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorialDecision {
    Publish,
    Interview,
    Revise,
    Reject,
}

impl EditorialDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Interview => "interview",
            Self::Revise => "revise",
            Self::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publish" => Some(Self::Publish),
            "interview" => Some(Self::Interview),
            "revise" => Some(Self::Revise),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for EditorialDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preferred channel for an interview request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewMethod {
    Phone,
    Email,
    None,
}

impl InterviewMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl fmt::Display for InterviewMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single located problem the judge wants fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewIssue {
    /// Issue category (e.g. "Legal", "Accuracy"). Free text from the judge.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
}

impl ReviewIssue {
    /// An issue spanning the whole article rather than a located passage.
    pub fn article_wide(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            location: "Article".to_string(),
            description: description.into(),
            suggestion: String::new(),
        }
    }
}

/// The judge's reasoning trail.
///
/// `failed_criteria` may be non-empty even when the issue list is empty;
/// that criterion-level failure is a distinct routing case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    #[serde(default)]
    pub checked_criteria: Vec<String>,
    #[serde(default)]
    pub failed_criteria: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    /// Secondary reasoning pass, distinct from the initial reasoning.
    #[serde(default)]
    pub reconsideration: Option<String>,
}

/// Whether and how a human source should be interviewed before the
/// publish/revise decision is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewDecision {
    #[serde(default)]
    pub needed: bool,
    #[serde(default = "InterviewDecision::default_method")]
    pub method: InterviewMethod,
    #[serde(default)]
    pub target_expertise_areas: Vec<String>,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub justification: String,
}

impl InterviewDecision {
    fn default_method() -> InterviewMethod {
        InterviewMethod::None
    }

    /// No interview required.
    pub fn not_needed() -> Self {
        Self {
            needed: false,
            method: InterviewMethod::None,
            target_expertise_areas: Vec::new(),
            focus: String::new(),
            justification: String::new(),
        }
    }
}

impl Default for InterviewDecision {
    fn default() -> Self {
        Self::not_needed()
    }
}

/// Structured editorial judgment, produced externally and routed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    #[serde(default)]
    pub issues: Vec<ReviewIssue>,
    #[serde(default)]
    pub reasoning: Reasoning,
    #[serde(default)]
    pub interview_decision: InterviewDecision,
    /// May be absent in raw judge output; the router defaults it.
    #[serde(default)]
    pub editorial_decision: Option<EditorialDecision>,
    /// Reader-facing sensitivity notice, orthogonal to routing.
    #[serde(default)]
    pub editorial_warning: Option<String>,
}

impl Verdict {
    /// A verdict with nothing to fix and no failed criteria.
    pub fn clean(&self) -> bool {
        self.issues.is_empty() && self.reasoning.failed_criteria.is_empty()
    }

    /// The automatic verdict substituted when the revision bound is hit.
    pub fn revision_limit_exceeded(revision_count: u32) -> Self {
        Self {
            status: VerdictStatus::IssuesFound,
            issues: vec![ReviewIssue::article_wide(
                "Process",
                format!(
                    "Revision limit exceeded: {} of {} allowed revision cycles used",
                    revision_count, MAX_REVISION_CYCLES
                ),
            )],
            reasoning: Reasoning {
                checked_criteria: Vec::new(),
                failed_criteria: vec!["revision_limit".to_string()],
                explanation: format!(
                    "Automatic rejection: the article was revised {} times without \
                     passing validation and no further revision attempts are allowed",
                    revision_count
                ),
                reconsideration: None,
            },
            interview_decision: InterviewDecision::not_needed(),
            editorial_decision: Some(EditorialDecision::Reject),
            editorial_warning: None,
        }
    }

    /// The deterministic rejecting verdict substituted when a collaborator
    /// invocation fails. The workflow must never be left without a verdict.
    pub fn technical_failure(operation: &str, error: &str) -> Self {
        Self {
            status: VerdictStatus::IssuesFound,
            issues: vec![ReviewIssue::article_wide(
                "Technical",
                format!("{} failed: {}", operation, error),
            )],
            reasoning: Reasoning {
                checked_criteria: Vec::new(),
                failed_criteria: vec!["technical_failure".to_string()],
                explanation: format!(
                    "Automatic rejection: {} failed and the article could not be judged",
                    operation
                ),
                reconsideration: None,
            },
            interview_decision: InterviewDecision::not_needed(),
            editorial_decision: Some(EditorialDecision::Reject),
            editorial_warning: None,
        }
    }

    /// Translate a fix-validation result back into a verdict for re-routing.
    ///
    /// `revision_count` is the article's count after the cycle that was just
    /// validated; it determines whether a failed validation recommends
    /// another revision or a rejection.
    pub fn from_validation(validation: &ValidationResult, revision_count: u32) -> Self {
        if validation.all_fixes_verified {
            return Self {
                status: VerdictStatus::Ok,
                issues: Vec::new(),
                reasoning: Reasoning {
                    checked_criteria: Vec::new(),
                    failed_criteria: Vec::new(),
                    explanation: validation.summary.clone(),
                    reconsideration: None,
                },
                interview_decision: InterviewDecision::not_needed(),
                editorial_decision: Some(EditorialDecision::Publish),
                editorial_warning: None,
            };
        }

        let decision = if revision_count < MAX_REVISION_CYCLES {
            EditorialDecision::Revise
        } else {
            EditorialDecision::Reject
        };

        Self {
            status: VerdictStatus::IssuesFound,
            issues: validation
                .remaining_issues
                .iter()
                .map(|issue| ReviewIssue::article_wide("Unresolved", issue.clone()))
                .collect(),
            reasoning: Reasoning {
                checked_criteria: Vec::new(),
                failed_criteria: Vec::new(),
                explanation: validation.summary.clone(),
                reconsideration: None,
            },
            interview_decision: InterviewDecision::not_needed(),
            editorial_decision: Some(decision),
            editorial_warning: None,
        }
    }

    /// A short description of the verdict suitable for logging.
    ///
    /// Avoids logging issue descriptions or reasoning text wholesale.
    pub fn log_summary(&self) -> String {
        format!(
            "Verdict {{ status: {}, issues: {}, failed_criteria: {}, interview: {}, decision: {} }}",
            self.status,
            self.issues.len(),
            self.reasoning.failed_criteria.len(),
            self.interview_decision.needed,
            self.editorial_decision
                .map(|d| d.as_str())
                .unwrap_or("unset"),
        )
    }
}

/// Result of the Fix Validator's narrow re-check.
///
/// The validator verifies only the issues it was handed; it does not hunt
/// for new ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub all_fixes_verified: bool,
    #[serde(default)]
    pub remaining_issues: Vec<String>,
    #[serde(default)]
    pub summary: String,
}
