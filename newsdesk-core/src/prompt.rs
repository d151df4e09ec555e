//! Prompt construction for the editorial collaborators.

use crate::verdict::{InterviewDecision, ReviewIssue};

/// System prompt for the editorial review judge.
pub fn get_editor_system_prompt() -> String {
    include_str!("../prompts/editor.txt").to_string()
}

/// System prompt for the content reviser.
pub fn get_reviser_system_prompt() -> String {
    include_str!("../prompts/reviser.txt").to_string()
}

/// System prompt for the fix validator.
pub fn get_fix_validator_system_prompt() -> String {
    include_str!("../prompts/fix_validator.txt").to_string()
}

/// System prompt for the interview question writer.
pub fn get_question_writer_system_prompt() -> String {
    include_str!("../prompts/question_writer.txt").to_string()
}

/// Build the correction request handed to the reviser.
///
/// Lists every issue with its location and suggestion, then the judge's
/// general feedback and any additional context (reconsideration notes,
/// interview findings, editorial warning).
pub fn create_correction_prompt(
    title: &str,
    content: &str,
    issues: &[ReviewIssue],
    feedback: &str,
    context: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "Below is a news article that failed editorial review, followed by the issues to fix.\n",
    );

    prompt.push_str("\nARTICLE TITLE:\n");
    prompt.push_str(title);
    prompt.push_str("\n\nARTICLE CONTENT:\n");
    prompt.push_str(content);

    prompt.push_str("\n\nISSUES TO FIX:\n");
    for (index, issue) in issues.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [{}] at {}: {}\n",
            index + 1,
            issue.kind,
            issue.location,
            issue.description
        ));
        if !issue.suggestion.is_empty() {
            prompt.push_str(&format!("   Suggested fix: {}\n", issue.suggestion));
        }
    }

    if !feedback.is_empty() {
        prompt.push_str("\nGENERAL FEEDBACK:\n");
        prompt.push_str(feedback);
        prompt.push('\n');
    }

    if let Some(context) = context {
        prompt.push_str("\nADDITIONAL CONTEXT:\n");
        prompt.push_str(context);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nRewrite the article so every listed issue is resolved. Keep the language and \
         factual claims that were not flagged. Reply with the rewritten headline after a \
         `TITLE:` line and the rewritten markdown body after a `CONTENT:` line.\n",
    );

    prompt
}

/// Build the validation request handed to the fix validator.
///
/// The validator checks only the named issues against the revised text; it
/// is not asked to perform a fresh full review.
pub fn create_validation_prompt(issues: &[ReviewIssue], title: &str, content: &str) -> String {
    let mut prompt = String::from("Below are previously reported issues and a revised article.\n");

    prompt.push_str("\nPREVIOUSLY REPORTED ISSUES:\n");
    for (index, issue) in issues.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [{}] at {}: {}\n",
            index + 1,
            issue.kind,
            issue.location,
            issue.description
        ));
    }

    prompt.push_str("\nREVISED TITLE:\n");
    prompt.push_str(title);
    prompt.push_str("\n\nREVISED CONTENT:\n");
    prompt.push_str(content);
    prompt.push_str(
        "\n\nFor each listed issue decide whether the revision resolved it. Do not report \
         new issues.\n",
    );

    prompt
}

/// Build the question-writing request for an interview.
pub fn create_question_prompt(
    article_title: &str,
    decision: &InterviewDecision,
    max_questions: usize,
) -> String {
    let mut prompt = format!(
        "An article titled \"{}\" needs input from a human source before it can be \
         finalized.\n\nINTERVIEW FOCUS:\n{}\n",
        article_title, decision.focus
    );

    if !decision.target_expertise_areas.is_empty() {
        prompt.push_str("\nTARGET EXPERTISE AREAS:\n");
        for area in &decision.target_expertise_areas {
            prompt.push_str(&format!("- {}\n", area));
        }
    }

    if !decision.justification.is_empty() {
        prompt.push_str("\nWHY AN INTERVIEW IS NEEDED:\n");
        prompt.push_str(&decision.justification);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nWrite at most {} short, specific questions for the source.\n",
        max_questions
    ));

    prompt
}
