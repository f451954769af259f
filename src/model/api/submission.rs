use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        answer::{admissible, Answer, Answers, Scalar},
        question::QuestionType,
    },
    db::{
        form::Form,
        submission::{NewSubmission, Submission},
    },
    mongodb::ApiId,
};

/// Whether the given text looks like an email address: `local@domain.tld` with no whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

/// A respondent's answers, as posted to a public form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub answers: Answers,
}

impl SubmissionRequest {
    /// Check these answers against the form's questions and build the submission to store.
    pub fn into_new_submission(
        self,
        form: &Form,
        created_at: DateTime<Utc>,
    ) -> Result<NewSubmission, String> {
        let known: HashSet<&str> = form
            .questions
            .iter()
            .map(|question| question.question_id.as_str())
            .collect();
        if let Some(unknown) = self.answers.keys().find(|id| !known.contains(id.as_str())) {
            return Err(format!("Unknown question '{unknown}'"));
        }

        let missing: Vec<&str> = form
            .questions
            .iter()
            .filter(|question| question.is_required)
            .filter(|question| admissible(&self.answers, &question.question_id).is_none())
            .map(|question| question.question_text.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "Please answer the required questions: {}",
                missing.join(", ")
            ));
        }

        let mut email = None;
        for question in &form.questions {
            let Some(answer) = admissible(&self.answers, &question.question_id) else {
                continue;
            };
            match (question.question_type, answer) {
                (QuestionType::Single, Answer::Multiple(_)) => {
                    return Err(format!(
                        "'{}' takes a single answer",
                        question.question_text
                    ));
                }
                (QuestionType::Multiple, Answer::Single(_)) => {
                    return Err(format!("'{}' takes a list of answers", question.question_text));
                }
                (QuestionType::Email, Answer::Single(Scalar::Text(text))) => {
                    if !is_plausible_email(text.trim()) {
                        return Err(format!("'{text}' is not a valid email address"));
                    }
                    email.get_or_insert_with(|| text.trim().to_lowercase());
                }
                (QuestionType::Email, _) => {
                    return Err(format!(
                        "'{}' takes an email address",
                        question.question_text
                    ));
                }
                _ => {}
            }
        }

        // Forms without an email question may still collect one under the `email` key.
        if email.is_none() {
            email = admissible(&self.answers, "email")
                .and_then(|answer| match answer {
                    Answer::Single(Scalar::Text(text)) => Some(text.trim().to_lowercase()),
                    _ => None,
                })
                .filter(|text| is_plausible_email(text));
        }

        Ok(NewSubmission {
            form_id: form.id,
            email,
            answers: self.answers,
            created_at,
        })
    }
}

/// A stored submission, for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDescription {
    pub id: ApiId,
    pub form_id: ApiId,
    pub email: Option<String>,
    pub answers: Answers,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionDescription {
    fn from(submission: Submission) -> Self {
        Self {
            id: submission.id.into(),
            form_id: submission.submission.form_id.into(),
            email: submission.submission.email,
            answers: submission.submission.answers,
            created_at: submission.submission.created_at,
        }
    }
}

/// Returned to the respondent after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub id: ApiId,
}
