//! Built-in form templates that admins can start a new form from.

use serde::Serialize;

use crate::model::{
    api::form::{FormSpec, QuestionSpec},
    common::question::{QuestionOption, QuestionType},
};

/// A ready-made form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormTemplate {
    pub id: &'static str,
    pub category: &'static str,
    pub form: FormSpec,
}

/// Find a built-in template by ID.
pub fn template(id: &str) -> Option<FormTemplate> {
    templates().into_iter().find(|template| template.id == id)
}

/// All built-in templates.
pub fn templates() -> Vec<FormTemplate> {
    vec![
        FormTemplate {
            id: "event-feedback",
            category: "Events",
            form: FormSpec {
                name: "Event Feedback".to_string(),
                description: Some("Tell us how the event went.".to_string()),
                is_active: true,
                custom_slug: None,
                questions: vec![
                    text("name", "Your name", QuestionType::Text, false),
                    text("email", "Email address", QuestionType::Email, true),
                    select(
                        "overall_rating",
                        "How would you rate the event overall?",
                        QuestionType::Single,
                        &["Excellent", "Good", "Average", "Poor"],
                    ),
                    select(
                        "highlights",
                        "Which sessions did you enjoy?",
                        QuestionType::Multiple,
                        &["Keynote", "Workshops", "Panel discussion", "Networking"],
                    ),
                    select(
                        "attend_again",
                        "Would you attend again?",
                        QuestionType::Single,
                        &["Yes", "Maybe", "No"],
                    ),
                    text("suggestions", "What could we do better?", QuestionType::Fill, false),
                ],
            },
        },
        FormTemplate {
            id: "member-interests",
            category: "Community",
            form: FormSpec {
                name: "Member Interest Survey".to_string(),
                description: Some("Help us plan activities you'll love.".to_string()),
                is_active: true,
                custom_slug: None,
                questions: vec![
                    text("full_name", "Full name", QuestionType::Text, true),
                    text("email_address", "Email address", QuestionType::Email, true),
                    select(
                        "year",
                        "Which year are you in?",
                        QuestionType::Single,
                        &["First", "Second", "Third", "Final"],
                    ),
                    select(
                        "interests",
                        "Which areas interest you?",
                        QuestionType::Multiple,
                        &["Startups", "Design", "Marketing", "Engineering", "Finance"],
                    ),
                    select(
                        "team_role",
                        "Which team role suits you best?",
                        QuestionType::Single,
                        &["Leader", "Builder", "Researcher", "Communicator"],
                    ),
                    select(
                        "activities",
                        "Which activities would you join?",
                        QuestionType::Multiple,
                        &["Hackathons", "Speaker sessions", "Mentoring", "Socials"],
                    ),
                    text("idea", "Pitch us an idea in one line", QuestionType::Fill, false),
                ],
            },
        },
        FormTemplate {
            id: "contact",
            category: "General",
            form: FormSpec {
                name: "Contact Us".to_string(),
                description: None,
                is_active: true,
                custom_slug: None,
                questions: vec![
                    text("name", "Name", QuestionType::Text, true),
                    text("email", "Email", QuestionType::Email, true),
                    select(
                        "topic",
                        "What is this about?",
                        QuestionType::Single,
                        &["Question", "Feedback", "Partnership", "Other"],
                    ),
                    text("message", "Message", QuestionType::Fill, true),
                ],
            },
        },
    ]
}

fn text(id: &str, text: &str, question_type: QuestionType, is_required: bool) -> QuestionSpec {
    QuestionSpec {
        question_id: id.to_string(),
        question_text: text.to_string(),
        question_type,
        options: None,
        is_required,
        placeholder: None,
    }
}

/// A required select question whose option values are derived from the labels.
fn select(id: &str, text: &str, question_type: QuestionType, labels: &[&str]) -> QuestionSpec {
    let options = labels
        .iter()
        .map(|label| QuestionOption {
            label: label.to_string(),
            value: label.to_lowercase().replace(' ', "_"),
        })
        .collect();
    QuestionSpec {
        question_id: id.to_string(),
        question_text: text.to_string(),
        question_type,
        options: Some(options),
        is_required: true,
        placeholder: None,
    }
}
