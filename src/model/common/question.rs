use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analytics::decode_entities;

/// Question IDs that hold respondent identity rather than opinions; never charted.
const IDENTITY_QUESTION_IDS: [&str; 4] = ["name", "email", "full_name", "email_address"];

/// Question IDs that hold respondent email addresses; never exported as columns.
const EMAIL_QUESTION_IDS: [&str; 2] = ["email", "email_address"];

/// The kinds of question a form can ask.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Pick exactly one option.
    Single,
    /// Pick any number of options.
    Multiple,
    /// Short free text.
    Text,
    /// An email address.
    Email,
    /// Longer free text.
    Fill,
}

impl QuestionType {
    /// Whether answers are chosen from a declared option list.
    pub fn is_select(self) -> bool {
        matches!(self, Self::Single | Self::Multiple)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
            Self::Text => "text",
            Self::Email => "email",
            Self::Fill => "fill",
        }
    }
}

/// One selectable option of a select question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Display text. May have been stored HTML-entity-encoded.
    pub label: String,
    /// The value recorded in answers.
    pub value: String,
}

/// A single question within a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within the owning form. Answers are keyed by this.
    pub question_id: String,
    /// Question text.
    pub question_text: String,
    /// Question type.
    pub question_type: QuestionType,
    /// Declared options, only present for select types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    /// Whether the question must be answered.
    pub is_required: bool,
    /// Display position, starting from 1.
    pub order_number: u32,
    /// Input hint for text questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Question {
    /// The declared options, or an empty slice.
    pub fn options(&self) -> &[QuestionOption] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Map each option value to its decoded label. The first option wins if values repeat.
    pub fn label_lookup(&self) -> HashMap<&str, String> {
        let mut lookup = HashMap::with_capacity(self.options().len());
        for option in self.options() {
            lookup
                .entry(option.value.as_str())
                .or_insert_with(|| decode_entities(&option.label));
        }
        lookup
    }

    /// Whether answers to this question identify the respondent by email.
    pub fn holds_email(&self) -> bool {
        self.question_type == QuestionType::Email
            || EMAIL_QUESTION_IDS
                .iter()
                .any(|id| self.question_id.eq_ignore_ascii_case(id))
    }

    /// Whether this question gets a chart on the analytics dashboard.
    pub fn is_chartable(&self) -> bool {
        self.question_type.is_select()
            && !IDENTITY_QUESTION_IDS
                .iter()
                .any(|id| self.question_id.eq_ignore_ascii_case(id))
    }
}

/// Example data for tests.
#[cfg(test)]
pub(crate) mod examples {
    use super::*;

    pub fn options(pairs: &[(&str, &str)]) -> Option<Vec<QuestionOption>> {
        Some(
            pairs
                .iter()
                .map(|(label, value)| QuestionOption {
                    label: label.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        )
    }

    impl Question {
        pub fn example_single() -> Self {
            Self {
                question_id: "color".to_string(),
                question_text: "Favourite colour?".to_string(),
                question_type: QuestionType::Single,
                options: options(&[("Red", "red"), ("Blue", "blue")]),
                is_required: true,
                order_number: 1,
                placeholder: None,
            }
        }

        pub fn example_multiple() -> Self {
            Self {
                question_id: "hobbies".to_string(),
                question_text: "What do you enjoy?".to_string(),
                question_type: QuestionType::Multiple,
                options: options(&[("Sports", "sports"), ("Music", "music")]),
                is_required: false,
                order_number: 2,
                placeholder: None,
            }
        }

        pub fn example_email() -> Self {
            Self {
                question_id: "contact".to_string(),
                question_text: "Your email".to_string(),
                question_type: QuestionType::Email,
                options: None,
                is_required: false,
                order_number: 3,
                placeholder: Some("you@example.com".to_string()),
            }
        }

        pub fn example_text() -> Self {
            Self {
                question_id: "comments".to_string(),
                question_text: "Anything else?".to_string(),
                question_type: QuestionType::Fill,
                options: None,
                is_required: false,
                order_number: 4,
                placeholder: None,
            }
        }
    }
}
