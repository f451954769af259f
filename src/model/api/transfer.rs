//! The JSON format forms' questions are exported in and imported from.

use serde::{Deserialize, Serialize};

use crate::model::{
    api::form::{FormSpec, QuestionSpec},
    common::question::{Question, QuestionOption, QuestionType},
    db::form::FormCore,
};

/// The name given to imported forms that don't carry one.
pub const DEFAULT_IMPORT_NAME: &str = "Imported Form";

/// A form's questions, exported for reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionExport {
    pub form_name: String,
    pub questions: Vec<QuestionSpec>,
}

impl From<&FormCore> for QuestionExport {
    fn from(form: &FormCore) -> Self {
        Self {
            form_name: form.name.clone(),
            questions: form.questions.iter().cloned().map(QuestionSpec::from).collect(),
        }
    }
}

impl QuestionExport {
    /// The questions with their order numbers restored from position.
    pub fn questions(&self) -> Vec<Question> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, spec)| Question {
                question_id: spec.question_id.clone(),
                question_text: spec.question_text.clone(),
                question_type: spec.question_type,
                options: spec.options.clone(),
                is_required: spec.is_required,
                order_number: i as u32 + 1,
                placeholder: spec.placeholder.clone(),
            })
            .collect()
    }
}

/// An option given either as plain text or as a full label/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImportedOption {
    Plain(String),
    Full(QuestionOption),
}

impl From<ImportedOption> for QuestionOption {
    fn from(option: ImportedOption) -> Self {
        match option {
            ImportedOption::Plain(text) => QuestionOption {
                label: text.clone(),
                value: text,
            },
            ImportedOption::Full(option) => option,
        }
    }
}

/// A question in an uploaded question file. Everything but the text may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportedQuestion {
    #[serde(alias = "question")]
    pub question_text: String,
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default, alias = "type")]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub options: Option<Vec<ImportedOption>>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// An uploaded question file. Both the export format and hand-written files are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormImport {
    #[serde(default, alias = "form_title", alias = "title")]
    pub form_name: Option<String>,
    #[serde(default, alias = "form_description")]
    pub description: Option<String>,
    pub questions: Vec<ImportedQuestion>,
}

impl From<FormImport> for FormSpec {
    /// Fill in defaults: IDs `q_<n>`, type `text`, and required unless stated otherwise.
    fn from(import: FormImport) -> Self {
        let questions = import
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| QuestionSpec {
                question_id: question
                    .question_id
                    .filter(|id| !id.trim().is_empty())
                    .unwrap_or_else(|| format!("q_{}", i + 1)),
                question_text: question.question_text,
                question_type: question.question_type.unwrap_or(QuestionType::Text),
                options: question
                    .options
                    .map(|options| options.into_iter().map(QuestionOption::from).collect()),
                is_required: question.is_required.unwrap_or(true),
                placeholder: question.placeholder,
            })
            .collect();

        FormSpec {
            name: import
                .form_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMPORT_NAME.to_string()),
            description: import.description,
            is_active: true,
            custom_slug: None,
            questions,
        }
    }
}
