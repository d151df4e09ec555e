//! LLM-backed implementations of the collaborator traits.
//!
//! Each agent shares the chat client, requests a strict JSON schema where
//! the contract is structured, and sanitizes what comes back: enumerated
//! literals are parsed and malformed fields are defaulted rather than
//! trusted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use newsdesk_core::article::Article;
use newsdesk_core::llm::{ChatClient, EmbeddingClient};
use newsdesk_core::parse::parse_verdict;
use newsdesk_core::prompt::{
    create_correction_prompt, create_question_prompt, create_validation_prompt,
    get_editor_system_prompt, get_fix_validator_system_prompt, get_question_writer_system_prompt,
    get_reviser_system_prompt,
};
use newsdesk_core::verdict::{InterviewDecision, ReviewIssue, ValidationResult, Verdict};

use super::{CorrectionRequest, Editor, Embedder, FixValidator, QuestionWriter, Reviser};

/// Editorial review judge over the chat client.
pub struct LlmEditor {
    client: ChatClient,
}

impl LlmEditor {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn response_format() -> newsdesk_core::llm::ResponseFormat {
        ChatClient::json_schema(
            "editorial_verdict",
            json!({
                "type": "object",
                "properties": {
                    "status": { "type": "string", "enum": ["OK", "ISSUES_FOUND", "RECONSIDERATION"] },
                    "issues": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "type": { "type": "string" },
                                "location": { "type": "string" },
                                "description": { "type": "string" },
                                "suggestion": { "type": "string" }
                            },
                            "required": ["type", "location", "description", "suggestion"],
                            "additionalProperties": false
                        }
                    },
                    "reasoning": {
                        "type": "object",
                        "properties": {
                            "checked_criteria": { "type": "array", "items": { "type": "string" } },
                            "failed_criteria": { "type": "array", "items": { "type": "string" } },
                            "explanation": { "type": "string" },
                            "reconsideration": { "type": ["string", "null"] }
                        },
                        "required": ["checked_criteria", "failed_criteria", "explanation", "reconsideration"],
                        "additionalProperties": false
                    },
                    "interview_decision": {
                        "type": "object",
                        "properties": {
                            "needed": { "type": "boolean" },
                            "method": { "type": "string", "enum": ["phone", "email", "none"] },
                            "target_expertise_areas": { "type": "array", "items": { "type": "string" } },
                            "focus": { "type": "string" },
                            "justification": { "type": "string" }
                        },
                        "required": ["needed", "method", "target_expertise_areas", "focus", "justification"],
                        "additionalProperties": false
                    },
                    "editorial_decision": { "type": ["string", "null"], "enum": ["publish", "interview", "revise", "reject", null] },
                    "editorial_warning": { "type": ["string", "null"] }
                },
                "required": ["status", "issues", "reasoning", "interview_decision", "editorial_decision", "editorial_warning"],
                "additionalProperties": false
            }),
        )
    }
}

#[async_trait]
impl Editor for LlmEditor {
    async fn review(&self, article: &Article) -> Result<Verdict> {
        let user_prompt = format!(
            "LANGUAGE: {}\nCATEGORIES: {}\nKEYWORDS: {}\n\nTITLE:\n{}\n\nCONTENT:\n{}\n",
            article.language,
            article.categories.join(", "),
            article.keywords.join(", "),
            article.title,
            article.content
        );

        let value = self
            .client
            .complete_json(
                &get_editor_system_prompt(),
                &user_prompt,
                Self::response_format(),
            )
            .await?;

        Ok(parse_verdict(&value))
    }
}

/// Content reviser over the chat client.
pub struct LlmReviser {
    client: ChatClient,
}

impl LlmReviser {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reviser for LlmReviser {
    async fn revise(&self, request: &CorrectionRequest) -> Result<String> {
        let user_prompt = create_correction_prompt(
            &request.title,
            &request.content,
            &request.issues,
            &request.feedback,
            request.context.as_deref(),
        );

        self.client
            .complete(&get_reviser_system_prompt(), &user_prompt, None)
            .await
    }
}

/// Fix validator over the chat client.
pub struct LlmFixValidator {
    client: ChatClient,
}

impl LlmFixValidator {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn response_format() -> newsdesk_core::llm::ResponseFormat {
        ChatClient::json_schema(
            "fix_validation",
            json!({
                "type": "object",
                "properties": {
                    "all_fixes_verified": { "type": "boolean" },
                    "remaining_issues": { "type": "array", "items": { "type": "string" } },
                    "summary": { "type": "string" }
                },
                "required": ["all_fixes_verified", "remaining_issues", "summary"],
                "additionalProperties": false
            }),
        )
    }
}

#[async_trait]
impl FixValidator for LlmFixValidator {
    async fn validate(
        &self,
        issues: &[ReviewIssue],
        title: &str,
        content: &str,
    ) -> Result<ValidationResult> {
        let user_prompt = create_validation_prompt(issues, title, content);

        let value = self
            .client
            .complete_json(
                &get_fix_validator_system_prompt(),
                &user_prompt,
                Self::response_format(),
            )
            .await?;

        serde_json::from_value(value).context("Fix validator response did not match the contract")
    }
}

/// Interview question writer over the chat client.
pub struct LlmQuestionWriter {
    client: ChatClient,
}

impl LlmQuestionWriter {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn response_format() -> newsdesk_core::llm::ResponseFormat {
        ChatClient::json_schema(
            "interview_questions",
            json!({
                "type": "object",
                "properties": {
                    "questions": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["questions"],
                "additionalProperties": false
            }),
        )
    }
}

#[async_trait]
impl QuestionWriter for LlmQuestionWriter {
    async fn write_questions(
        &self,
        article: &Article,
        decision: &InterviewDecision,
        max_questions: usize,
    ) -> Result<Vec<String>> {
        let user_prompt = create_question_prompt(&article.title, decision, max_questions);

        let value = self
            .client
            .complete_json(
                &get_question_writer_system_prompt(),
                &user_prompt,
                Self::response_format(),
            )
            .await?;

        let questions: Vec<String> = value
            .get("questions")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(questions.into_iter().take(max_questions).collect())
    }
}

/// Publish-time embedder over the embeddings client.
pub struct LlmEmbedder {
    client: EmbeddingClient,
}

impl LlmEmbedder {
    pub fn new(client: EmbeddingClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Embedder for LlmEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }
}
