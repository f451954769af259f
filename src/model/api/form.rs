use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::question::{Question, QuestionOption, QuestionType},
    db::form::{Form, NewForm},
    mongodb::ApiId,
};

/// A question as submitted by an admin. Its position in the form decides its order number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub question_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl QuestionSpec {
    /// The declared options, or an empty slice.
    pub fn options(&self) -> &[QuestionOption] {
        self.options.as_deref().unwrap_or_default()
    }

    fn into_question(self, order_number: u32) -> Result<Question, String> {
        if self.question_id.trim().is_empty() {
            return Err(format!("Question {order_number} has no ID"));
        }
        if self.question_text.trim().is_empty() {
            return Err(format!("Question '{}' has no text", self.question_id));
        }

        let options = if self.question_type.is_select() {
            let options = self.options.unwrap_or_default();
            if options.is_empty() {
                return Err(format!(
                    "Question '{}' needs at least one option",
                    self.question_id
                ));
            }
            let mut values = HashSet::new();
            for option in &options {
                if option.value.is_empty() || !values.insert(option.value.as_str()) {
                    return Err(format!(
                        "Question '{}' has an empty or repeated option value",
                        self.question_id
                    ));
                }
            }
            Some(options)
        } else {
            None
        };

        Ok(Question {
            question_id: self.question_id,
            question_text: self.question_text,
            question_type: self.question_type,
            options,
            is_required: self.is_required,
            order_number,
            placeholder: self.placeholder.filter(|p| !p.is_empty()),
        })
    }
}

impl From<Question> for QuestionSpec {
    fn from(question: Question) -> Self {
        Self {
            question_id: question.question_id,
            question_text: question.question_text,
            question_type: question.question_type,
            options: question.options,
            is_required: question.is_required,
            placeholder: question.placeholder,
        }
    }
}

/// A form as submitted by an admin, for creation or replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub custom_slug: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
}

fn default_active() -> bool {
    true
}

/// Whether a slug is made only of letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl FormSpec {
    /// Validate this spec and build the form to store.
    ///
    /// Blank descriptions and slugs are treated as absent.
    pub fn into_new_form(
        self,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Result<NewForm, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("Form name is required".to_string());
        }

        let custom_slug = self
            .custom_slug
            .map(|slug| slug.trim().to_string())
            .filter(|slug| !slug.is_empty());
        if let Some(slug) = &custom_slug {
            if !is_valid_slug(slug) {
                return Err(format!(
                    "Custom slug '{slug}' may only contain letters, numbers, hyphens and underscores"
                ));
            }
        }

        let mut ids = HashSet::new();
        let mut questions = Vec::with_capacity(self.questions.len());
        for (i, spec) in self.questions.into_iter().enumerate() {
            let question = spec.into_question(i as u32 + 1)?;
            if !ids.insert(question.question_id.clone()) {
                return Err(format!("Duplicate question ID '{}'", question.question_id));
            }
            questions.push(question);
        }

        Ok(NewForm {
            name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            is_active: self.is_active,
            custom_slug,
            created_at,
            created_by,
            questions,
        })
    }
}

/// A complete form, for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescription {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub custom_slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub questions: Vec<Question>,
}

impl From<Form> for FormDescription {
    fn from(form: Form) -> Self {
        Self {
            id: form.id.into(),
            name: form.form.name,
            description: form.form.description,
            is_active: form.form.is_active,
            custom_slug: form.form.custom_slug,
            created_at: form.form.created_at,
            created_by: form.form.created_by,
            questions: form.form.questions,
        }
    }
}

/// One row of the admin form list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub custom_slug: Option<String>,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
    pub response_count: u64,
}

impl FormSummary {
    pub fn new(form: Form, response_count: u64) -> Self {
        Self {
            id: form.id.into(),
            question_count: form.questions.len(),
            name: form.form.name,
            description: form.form.description,
            is_active: form.form.is_active,
            custom_slug: form.form.custom_slug,
            created_at: form.form.created_at,
            response_count,
        }
    }
}

/// The view of an active form that respondents get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicForm {
    pub id: ApiId,
    pub name: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

impl From<Form> for PublicForm {
    fn from(form: Form) -> Self {
        Self {
            id: form.id.into(),
            name: form.form.name,
            description: form.form.description,
            questions: form.form.questions,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl FormSpec {
        pub fn example() -> Self {
            let form = NewForm::example();
            Self {
                name: form.name,
                description: form.description,
                is_active: form.is_active,
                custom_slug: form.custom_slug,
                questions: form.questions.into_iter().map(QuestionSpec::from).collect(),
            }
        }
    }
}
