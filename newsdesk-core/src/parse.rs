//! Sanitizing parsers for collaborator output.
//!
//! The judges and the reviser are LLM-backed: their output is structured by
//! request but never trusted. Enumerated literals are parsed through the
//! `parse` functions on the verdict enums and malformed fields are defaulted
//! rather than propagated; a verdict whose status cannot be read is treated
//! as having found issues, never as a pass.

use serde_json::Value;
use std::fmt;

use crate::verdict::{
    EditorialDecision, InterviewDecision, InterviewMethod, Reasoning, ReviewIssue, Verdict,
    VerdictStatus,
};

/// Marker the reviser must put in front of the rewritten headline.
pub const TITLE_MARKER: &str = "TITLE:";

/// Marker the reviser must put in front of the rewritten body.
pub const CONTENT_MARKER: &str = "CONTENT:";

/// Build a `Verdict` from an untrusted JSON value, defaulting every
/// malformed field.
pub fn parse_verdict(value: &Value) -> Verdict {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .and_then(VerdictStatus::parse)
        .unwrap_or(VerdictStatus::IssuesFound);

    let issues = value
        .get("issues")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_issue).collect())
        .unwrap_or_default();

    let reasoning = value
        .get("reasoning")
        .map(parse_reasoning)
        .unwrap_or_default();

    let interview_decision = value
        .get("interview_decision")
        .map(parse_interview_decision)
        .unwrap_or_default();

    let editorial_decision = value
        .get("editorial_decision")
        .and_then(Value::as_str)
        .and_then(EditorialDecision::parse);

    let editorial_warning = value
        .get("editorial_warning")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Verdict {
        status,
        issues,
        reasoning,
        interview_decision,
        editorial_decision,
        editorial_warning,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_issue(value: &Value) -> ReviewIssue {
    ReviewIssue {
        kind: string_field(value, "type"),
        location: string_field(value, "location"),
        description: string_field(value, "description"),
        suggestion: string_field(value, "suggestion"),
    }
}

fn parse_reasoning(value: &Value) -> Reasoning {
    Reasoning {
        checked_criteria: string_list(value, "checked_criteria"),
        failed_criteria: string_list(value, "failed_criteria"),
        explanation: string_field(value, "explanation"),
        reconsideration: value
            .get("reconsideration")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
    }
}

fn parse_interview_decision(value: &Value) -> InterviewDecision {
    InterviewDecision {
        needed: value
            .get("needed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        method: value
            .get("method")
            .and_then(Value::as_str)
            .and_then(InterviewMethod::parse)
            .unwrap_or(InterviewMethod::None),
        target_expertise_areas: string_list(value, "target_expertise_areas"),
        focus: string_field(value, "focus"),
        justification: string_field(value, "justification"),
    }
}

/// Title and content extracted from a reviser response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisedContent {
    pub title: String,
    pub content: String,
}

/// Why a reviser response could not be used.
///
/// Extraction failure is terminal for a revision cycle: the article is left
/// unchanged and no revision attempt is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No usable title marker or field.
    MissingTitle,
    /// No usable content marker or field.
    MissingContent,
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "reviser response is missing a title"),
            Self::MissingContent => write!(f, "reviser response is missing content"),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Extract the rewritten title and content from a reviser response.
///
/// Accepts either a JSON object with `title`/`content` fields or delimited
/// text using [`TITLE_MARKER`] and [`CONTENT_MARKER`]. Fails loudly when
/// either part cannot be found.
pub fn extract_revision(response: &str) -> Result<RevisedContent, ExtractionError> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let content = value
            .get("content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        return match (title, content) {
            (Some(title), Some(content)) => Ok(RevisedContent {
                title: title.to_string(),
                content: content.to_string(),
            }),
            (None, _) => Err(ExtractionError::MissingTitle),
            (_, None) => Err(ExtractionError::MissingContent),
        };
    }

    let title_start = trimmed
        .find(TITLE_MARKER)
        .ok_or(ExtractionError::MissingTitle)?;
    let after_title = &trimmed[title_start + TITLE_MARKER.len()..];

    let content_offset = after_title
        .find(CONTENT_MARKER)
        .ok_or(ExtractionError::MissingContent)?;

    let title = after_title[..content_offset].trim();
    let content = after_title[content_offset + CONTENT_MARKER.len()..].trim();

    if title.is_empty() {
        return Err(ExtractionError::MissingTitle);
    }
    if content.is_empty() {
        return Err(ExtractionError::MissingContent);
    }

    Ok(RevisedContent {
        title: title.to_string(),
        content: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_verdict_full() {
        let value = json!({
            "status": "ISSUES_FOUND",
            "issues": [{
                "type": "Legal",
                "location": "Paragraph 3",
                "description": "Allegation stated as fact",
                "suggestion": "Attribute to the indictment"
            }],
            "reasoning": {
                "checked_criteria": ["legal", "accuracy"],
                "failed_criteria": ["legal"],
                "explanation": "One legal issue found",
                "reconsideration": "Reviewed against the court filing"
            },
            "interview_decision": {
                "needed": true,
                "method": "phone",
                "target_expertise_areas": ["criminal law"],
                "focus": "Charges",
                "justification": "Needs an expert read"
            },
            "editorial_decision": "revise",
            "editorial_warning": "Contains graphic descriptions"
        });

        let verdict = parse_verdict(&value);
        assert_eq!(verdict.status, VerdictStatus::IssuesFound);
        assert_eq!(verdict.issues.len(), 1);
        assert_eq!(verdict.issues[0].kind, "Legal");
        assert_eq!(verdict.reasoning.failed_criteria, vec!["legal"]);
        assert_eq!(
            verdict.reasoning.reconsideration.as_deref(),
            Some("Reviewed against the court filing")
        );
        assert!(verdict.interview_decision.needed);
        assert_eq!(verdict.interview_decision.method, InterviewMethod::Phone);
        assert_eq!(verdict.editorial_decision, Some(EditorialDecision::Revise));
        assert_eq!(
            verdict.editorial_warning.as_deref(),
            Some("Contains graphic descriptions")
        );
    }

    #[test]
    fn test_parse_verdict_defaults_malformed_fields() {
        let value = json!({
            "status": "LOOKS_FINE",
            "issues": "not-a-list",
            "interview_decision": { "needed": "yes", "method": "carrier pigeon" },
            "editorial_decision": "ship it"
        });

        let verdict = parse_verdict(&value);
        // An unreadable status must never be treated as a pass.
        assert_eq!(verdict.status, VerdictStatus::IssuesFound);
        assert!(verdict.issues.is_empty());
        assert!(!verdict.interview_decision.needed);
        assert_eq!(verdict.interview_decision.method, InterviewMethod::None);
        assert_eq!(verdict.editorial_decision, None);
        assert_eq!(verdict.editorial_warning, None);
    }

    #[test]
    fn test_extract_revision_json() {
        let response = r#"{"title": "Council approves budget", "content": "The city council..."}"#;
        let revised = extract_revision(response).unwrap();
        assert_eq!(revised.title, "Council approves budget");
        assert_eq!(revised.content, "The city council...");
    }

    #[test]
    fn test_extract_revision_delimited() {
        let response = "Here is the corrected article.\n\nTITLE: Council approves budget\nCONTENT:\nThe city council voted 7-2 on Tuesday.";
        let revised = extract_revision(response).unwrap();
        assert_eq!(revised.title, "Council approves budget");
        assert_eq!(revised.content, "The city council voted 7-2 on Tuesday.");
    }

    #[test]
    fn test_extract_revision_missing_content_marker() {
        let response = "TITLE: Council approves budget\nThe body without its marker.";
        assert_eq!(
            extract_revision(response),
            Err(ExtractionError::MissingContent)
        );
    }

    #[test]
    fn test_extract_revision_missing_title() {
        let response = "CONTENT: body text only";
        assert_eq!(
            extract_revision(response),
            Err(ExtractionError::MissingTitle)
        );
    }

    #[test]
    fn test_extract_revision_json_empty_title() {
        let response = r#"{"title": "  ", "content": "body"}"#;
        assert_eq!(
            extract_revision(response),
            Err(ExtractionError::MissingTitle)
        );
    }
}
