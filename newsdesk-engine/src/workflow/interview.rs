//! The interview sub-flow.
//!
//! Selects a contact, resolves the channel, generates questions, and
//! dispatches the interview. The sub-flow never blocks waiting for a
//! reply: after a successful dispatch the article stays pending and the
//! eventual reply is correlated back by the tracking handle.
//!
//! Contact selection is deterministic: prefer the contact flagged primary
//! that has the required channel, otherwise the first contact with that
//! channel, otherwise none. A phone request falls back to email when no
//! phone-capable contact exists; with no reachable contact at all the
//! sub-flow fails closed.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use newsdesk_core::article::{Article, Contact};
use newsdesk_core::verdict::{InterviewDecision, InterviewMethod, Verdict};

use crate::collaborators::{call_with_timeout, QuestionWriter};
use crate::dispatch::{DispatchReceipt, InterviewChannel, InterviewDispatcher, InterviewPlan};
use crate::repository::ArticleRepository;

/// Phone interviews ask exactly this many questions, plus the closing
/// prompt.
pub const PHONE_QUESTION_COUNT: usize = 2;

/// Lower bound on questions for any channel.
pub const MIN_QUESTIONS: usize = 2;

/// Upper bound on email questions.
pub const MAX_EMAIL_QUESTIONS: usize = 5;

/// Open-ended prompt appended to every phone script.
pub const PHONE_CLOSING_PROMPT: &str =
    "Is there anything else about this story you think we should know?";

/// Why the interview sub-flow failed closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewError {
    /// No contact has any usable channel. The article stays pending.
    NoReachableContact,
    /// The channel service refused or failed the dispatch.
    Dispatch { message: String },
}

impl fmt::Display for InterviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReachableContact => {
                write!(f, "no contact is reachable on any interview channel")
            }
            Self::Dispatch { message } => write!(f, "interview dispatch failed: {}", message),
        }
    }
}

impl std::error::Error for InterviewError {}

/// Map a requested interview method to the channel it requires.
///
/// `none` (the judge wanted an interview but named no method) is treated
/// as email, the less intrusive channel.
pub fn required_channel(method: InterviewMethod) -> InterviewChannel {
    match method {
        InterviewMethod::Phone => InterviewChannel::Phone,
        InterviewMethod::Email | InterviewMethod::None => InterviewChannel::Email,
    }
}

/// Deterministic contact selection for a channel.
pub fn select_contact(contacts: &[Contact], channel: InterviewChannel) -> Option<&Contact> {
    let has_channel = |contact: &&Contact| match channel {
        InterviewChannel::Email => contact.has_email(),
        InterviewChannel::Phone => contact.has_phone(),
    };

    contacts
        .iter()
        .filter(has_channel)
        .find(|contact| contact.is_primary)
        .or_else(|| contacts.iter().find(has_channel))
}

/// Resolve the channel and contact for a requested method.
///
/// Falls back from phone to email when no phone-capable contact exists;
/// fails closed when neither channel has a contact.
pub fn resolve_recipient(
    contacts: &[Contact],
    method: InterviewMethod,
) -> Result<(InterviewChannel, &Contact), InterviewError> {
    let preferred = required_channel(method);

    if let Some(contact) = select_contact(contacts, preferred) {
        return Ok((preferred, contact));
    }

    if preferred == InterviewChannel::Phone {
        if let Some(contact) = select_contact(contacts, InterviewChannel::Email) {
            return Ok((InterviewChannel::Email, contact));
        }
    }

    Err(InterviewError::NoReachableContact)
}

/// How many questions the channel allows for this interview.
pub fn question_budget(channel: InterviewChannel, decision: &InterviewDecision) -> usize {
    match channel {
        InterviewChannel::Phone => PHONE_QUESTION_COUNT,
        InterviewChannel::Email => decision
            .target_expertise_areas
            .len()
            .clamp(MIN_QUESTIONS, MAX_EMAIL_QUESTIONS),
    }
}

/// Fixed templated questions keyed by expertise area.
///
/// Guarantees the sub-flow always has at least [`MIN_QUESTIONS`] questions
/// even when the question writer is unavailable.
pub fn fallback_questions(decision: &InterviewDecision, budget: usize) -> Vec<String> {
    let mut questions: Vec<String> = decision
        .target_expertise_areas
        .iter()
        .map(|area| {
            format!(
                "From your experience in {}, what is the most important thing our readers should understand about this story?",
                area
            )
        })
        .collect();

    if questions.len() < MIN_QUESTIONS {
        questions.push(
            "What important context do you think is missing from the reporting so far?".to_string(),
        );
    }
    if questions.len() < MIN_QUESTIONS {
        questions.push("What would you correct in how this story has been told?".to_string());
    }

    questions.truncate(budget.max(MIN_QUESTIONS));
    questions
}

fn render_email_body(plan_questions: &[String], contact: &Contact, article: &Article) -> String {
    let mut body = format!(
        "Dear {},\n\nWe are preparing an article titled \"{}\" and would value your \
         perspective. Could you help us with the following questions?\n\n",
        contact.name, article.title
    );
    for (index, question) in plan_questions.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", index + 1, question));
    }
    body.push_str("\nThank you for your time.\n");
    body
}

fn render_phone_script(plan_questions: &[String], contact: &Contact, article: &Article) -> String {
    let mut script = format!(
        "You are calling {} regarding the article \"{}\". Ask the following questions, \
         one at a time, and let them answer fully.\n",
        contact.name, article.title
    );
    for (index, question) in plan_questions.iter().enumerate() {
        script.push_str(&format!("{}. {}\n", index + 1, question));
    }
    script.push_str(&format!("Close with: {}\n", PHONE_CLOSING_PROMPT));
    script
}

/// Runs the interview sub-flow for one article.
pub struct InterviewRouter<'a> {
    question_writer: &'a dyn QuestionWriter,
    dispatcher: &'a dyn InterviewDispatcher,
    repository: &'a dyn ArticleRepository,
    timeout: Duration,
}

impl<'a> InterviewRouter<'a> {
    pub fn new(
        question_writer: &'a dyn QuestionWriter,
        dispatcher: &'a dyn InterviewDispatcher,
        repository: &'a dyn ArticleRepository,
        timeout: Duration,
    ) -> Self {
        Self {
            question_writer,
            dispatcher,
            repository,
            timeout,
        }
    }

    /// Build and dispatch the interview plan, returning immediately after a
    /// successful dispatch.
    pub async fn run(
        &self,
        article: &Article,
        verdict: &Verdict,
    ) -> Result<DispatchReceipt, InterviewError> {
        let decision = &verdict.interview_decision;
        let (channel, contact) = resolve_recipient(&article.contacts, decision.method)?;

        if channel != required_channel(decision.method) {
            info!(
                "Article {}: no {}-capable contact, falling back to {}",
                article.id,
                required_channel(decision.method),
                channel
            );
        }

        let budget = question_budget(channel, decision);
        let mut questions = match call_with_timeout(
            self.timeout,
            "question generation",
            self.question_writer.write_questions(article, decision, budget),
        )
        .await
        {
            Ok(questions) if questions.len() >= MIN_QUESTIONS => {
                questions.into_iter().take(budget).collect()
            }
            Ok(_) | Err(_) => {
                warn!(
                    "Question writer unavailable or insufficient for article {}, using templates",
                    article.id
                );
                fallback_questions(decision, budget)
            }
        };

        let address = match channel {
            InterviewChannel::Email => contact.email.clone().unwrap_or_default(),
            InterviewChannel::Phone => contact.phone.clone().unwrap_or_default(),
        };

        let message = match channel {
            InterviewChannel::Email => render_email_body(&questions, contact, article),
            InterviewChannel::Phone => {
                let script = render_phone_script(&questions, contact, article);
                questions.push(PHONE_CLOSING_PROMPT.to_string());
                script
            }
        };

        let plan = InterviewPlan {
            article_id: article.id.clone(),
            channel,
            recipient_name: contact.name.clone(),
            recipient_address: address,
            subject: format!("Questions about \"{}\"", article.title),
            questions,
            message,
        };

        let receipt = self
            .dispatcher
            .dispatch(&plan)
            .await
            .map_err(|e| InterviewError::Dispatch {
                message: e.to_string(),
            })?;

        if let Some(storage_id) = article.storage_id {
            if let Err(e) = self
                .repository
                .record_interview(storage_id, channel, &receipt.tracking_handle, Utc::now())
                .await
            {
                warn!(
                    "Failed to record interview dispatch {} for article {}: {}",
                    receipt.tracking_handle, article.id, e
                );
            }
        }

        info!(
            "Dispatched {} interview for article {} to {} ({})",
            channel, article.id, plan.recipient_name, receipt.tracking_handle
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{ArticleRepository, InMemoryRepository};
    use crate::test_support::{FakeDispatcher, FakeQuestionWriter};

    fn email_contact(name: &str, primary: bool) -> Contact {
        Contact {
            name: name.to_string(),
            title: "Analyst".to_string(),
            organization: "Example Org".to_string(),
            email: Some(format!("{}@example.org", name.to_lowercase())),
            phone: None,
            is_primary: primary,
        }
    }

    fn phone_contact(name: &str, primary: bool) -> Contact {
        Contact {
            name: name.to_string(),
            title: "Director".to_string(),
            organization: "Example Org".to_string(),
            email: None,
            phone: Some("+15550100".to_string()),
            is_primary: primary,
        }
    }

    fn interview_verdict(method: InterviewMethod, areas: Vec<&str>) -> Verdict {
        let mut verdict = Verdict::technical_failure("placeholder", "placeholder");
        verdict.editorial_decision = None;
        verdict.interview_decision = InterviewDecision {
            needed: true,
            method,
            target_expertise_areas: areas.into_iter().map(String::from).collect(),
            focus: "Disputed figures".to_string(),
            justification: "Numbers conflict with public records".to_string(),
        };
        verdict
    }

    #[test]
    fn test_select_contact_prefers_primary_with_channel() {
        let contacts = vec![
            email_contact("First", false),
            email_contact("Primary", true),
        ];
        let selected = select_contact(&contacts, InterviewChannel::Email).unwrap();
        assert_eq!(selected.name, "Primary");
    }

    #[test]
    fn test_select_contact_falls_back_to_first_with_channel() {
        let contacts = vec![phone_contact("NoEmail", true), email_contact("Second", false)];
        let selected = select_contact(&contacts, InterviewChannel::Email).unwrap();
        assert_eq!(selected.name, "Second");
    }

    #[test]
    fn test_resolve_phone_falls_back_to_email() {
        // Scenario D: phone requested but only an email contact exists.
        let contacts = vec![email_contact("OnlyEmail", false)];
        let (channel, contact) =
            resolve_recipient(&contacts, InterviewMethod::Phone).unwrap();
        assert_eq!(channel, InterviewChannel::Email);
        assert_eq!(contact.name, "OnlyEmail");
    }

    #[test]
    fn test_resolve_fails_closed_without_contacts() {
        let err = resolve_recipient(&[], InterviewMethod::Phone).unwrap_err();
        assert_eq!(err, InterviewError::NoReachableContact);
    }

    #[test]
    fn test_question_budget() {
        let mut decision = InterviewDecision::not_needed();
        decision.target_expertise_areas = vec!["one".to_string()];
        assert_eq!(question_budget(InterviewChannel::Phone, &decision), 2);
        assert_eq!(question_budget(InterviewChannel::Email, &decision), 2);

        decision.target_expertise_areas = (0..8).map(|i| format!("area-{}", i)).collect();
        assert_eq!(question_budget(InterviewChannel::Email, &decision), 5);
    }

    #[test]
    fn test_fallback_questions_always_at_least_two() {
        let decision = InterviewDecision::not_needed();
        let questions = fallback_questions(&decision, 5);
        assert!(questions.len() >= MIN_QUESTIONS);

        let mut with_areas = InterviewDecision::not_needed();
        with_areas.target_expertise_areas =
            vec!["municipal finance".to_string(), "zoning law".to_string()];
        let questions = fallback_questions(&with_areas, 5);
        assert_eq!(questions.len(), 2);
        assert!(questions[0].contains("municipal finance"));
    }

    #[tokio::test]
    async fn test_phone_fallback_produces_email_plan() {
        // Scenario D end to end.
        let repo = InMemoryRepository::new();
        let mut article = Article::new("a-1", "Headline", "Body");
        article.contacts = vec![email_contact("OnlyEmail", false)];
        let id = repo.upsert_article(&article).await.unwrap();
        article.storage_id = Some(id);

        let writer = FakeQuestionWriter::with_questions(vec![
            "How were the figures compiled?".to_string(),
            "Which records conflict?".to_string(),
        ]);
        let dispatcher = FakeDispatcher::succeeding();

        let router = InterviewRouter::new(&writer, &dispatcher, &repo, Duration::from_secs(5));
        let verdict = interview_verdict(InterviewMethod::Phone, vec!["finance"]);
        let receipt = router.run(&article, &verdict).await.unwrap();

        assert_eq!(receipt.channel, InterviewChannel::Email);

        let plans = dispatcher.dispatched_plans();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].channel, InterviewChannel::Email);
        assert_eq!(plans[0].recipient_address, "onlyemail@example.org");
        assert!(plans[0].questions.len() >= MIN_QUESTIONS);

        // The dispatch record allows the reply to be correlated later.
        assert_eq!(
            repo.find_article_by_tracking_handle(&receipt.tracking_handle)
                .await
                .unwrap(),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_phone_plan_has_two_questions_plus_closing() {
        let repo = InMemoryRepository::new();
        let mut article = Article::new("a-1", "Headline", "Body");
        article.contacts = vec![phone_contact("Caller", true)];

        let writer = FakeQuestionWriter::with_questions(vec![
            "Q1?".to_string(),
            "Q2?".to_string(),
            "Q3?".to_string(),
        ]);
        let dispatcher = FakeDispatcher::succeeding();

        let router = InterviewRouter::new(&writer, &dispatcher, &repo, Duration::from_secs(5));
        let verdict = interview_verdict(InterviewMethod::Phone, vec!["finance"]);
        router.run(&article, &verdict).await.unwrap();

        let plans = dispatcher.dispatched_plans();
        assert_eq!(plans[0].channel, InterviewChannel::Phone);
        // Exactly two questions plus the open closing prompt.
        assert_eq!(plans[0].questions.len(), PHONE_QUESTION_COUNT + 1);
        assert_eq!(
            plans[0].questions.last().map(String::as_str),
            Some(PHONE_CLOSING_PROMPT)
        );
        assert!(plans[0].message.contains(PHONE_CLOSING_PROMPT));
    }

    #[tokio::test]
    async fn test_question_writer_failure_uses_templates() {
        let repo = InMemoryRepository::new();
        let mut article = Article::new("a-1", "Headline", "Body");
        article.contacts = vec![email_contact("Reader", true)];

        let writer = FakeQuestionWriter::failing("no capacity");
        let dispatcher = FakeDispatcher::succeeding();

        let router = InterviewRouter::new(&writer, &dispatcher, &repo, Duration::from_secs(5));
        let verdict = interview_verdict(InterviewMethod::Email, vec!["zoning law"]);
        router.run(&article, &verdict).await.unwrap();

        let plans = dispatcher.dispatched_plans();
        assert!(plans[0].questions.len() >= MIN_QUESTIONS);
        assert!(plans[0].questions[0].contains("zoning law"));
    }

    #[tokio::test]
    async fn test_dispatch_failure_aborts_without_record() {
        let repo = InMemoryRepository::new();
        let mut article = Article::new("a-1", "Headline", "Body");
        article.contacts = vec![email_contact("Reader", true)];
        let id = repo.upsert_article(&article).await.unwrap();
        article.storage_id = Some(id);

        let writer = FakeQuestionWriter::with_questions(vec![
            "Q1?".to_string(),
            "Q2?".to_string(),
        ]);
        let dispatcher = FakeDispatcher::failing("relay unreachable");

        let router = InterviewRouter::new(&writer, &dispatcher, &repo, Duration::from_secs(5));
        let verdict = interview_verdict(InterviewMethod::Email, vec![]);
        let err = router.run(&article, &verdict).await.unwrap_err();

        assert!(matches!(err, InterviewError::Dispatch { .. }));
    }
}
