use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::question::Question, mongodb::Id};

/// Core form data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCore {
    pub name: String,
    pub description: Option<String>,
    /// Only active forms accept submissions or are publicly visible.
    pub is_active: bool,
    /// Optional public alias for the form, unique across all forms.
    pub custom_slug: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Username of the admin who created the form.
    pub created_by: String,
    /// Questions, sorted by `order_number`.
    pub questions: Vec<Question>,
}

impl FormCore {
    /// Find a question by ID.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.question_id == question_id)
    }
}

/// A form without an ID.
pub type NewForm = FormCore;

/// A form from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub form: FormCore,
}

impl Deref for Form {
    type Target = FormCore;

    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.form
    }
}
