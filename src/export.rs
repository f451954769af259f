//! Renders submissions as downloadable text tables.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};
use rocket::{http::ContentType, serde::json::serde_json};
use serde::Serialize;
use thiserror::Error;

use crate::{
    analytics::Response,
    model::common::{answer::Answers, question::Question},
};

pub const EMAIL_HEADER: &str = "Email";
pub const SUBMITTED_AT_HEADER: &str = "Submitted At";
/// Shown in place of a missing respondent email.
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    pub fn content_type(self) -> ContentType {
        match self {
            Self::Csv => ContentType::CSV,
            Self::Tsv => ContentType::new("text", "tab-separated-values"),
            Self::Markdown => ContentType::new("text", "markdown"),
            Self::Json => ContentType::JSON,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Whether a question gets its own column. Email questions don't, since the
/// respondent email already has one.
fn is_exported(question: &Question) -> bool {
    !question.holds_email()
}

/// The header row followed by one row per submission, in the order given.
pub fn rows<S: Response>(questions: &[Question], submissions: &[S]) -> Vec<Vec<String>> {
    let columns: Vec<&Question> = questions.iter().filter(|q| is_exported(q)).collect();

    let mut header = vec![EMAIL_HEADER.to_string(), SUBMITTED_AT_HEADER.to_string()];
    header.extend(columns.iter().map(|q| q.question_text.clone()));

    let mut rows = Vec::with_capacity(submissions.len() + 1);
    rows.push(header);
    for submission in submissions {
        let mut row = vec![
            submission.email().unwrap_or(ANONYMOUS).to_string(),
            submission.created_at().format("%Y-%m-%d").to_string(),
        ];
        row.extend(columns.iter().map(|question| {
            submission
                .answers()
                .get(&question.question_id)
                .and_then(Option::as_ref)
                .map(ToString::to_string)
                .unwrap_or_default()
        }));
        rows.push(row);
    }
    rows
}

/// Render submissions in the given format.
pub fn export<S: Response>(
    questions: &[Question],
    submissions: &[S],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => delimited(&rows(questions, submissions), b',', QuoteStyle::Always),
        ExportFormat::Tsv => {
            delimited(&rows(questions, submissions), b'\t', QuoteStyle::Necessary)
        }
        ExportFormat::Markdown => Ok(markdown(&rows(questions, submissions))),
        ExportFormat::Json => json(submissions),
    }
}

fn delimited(
    rows: &[Vec<String>],
    delimiter: u8,
    quote_style: QuoteStyle,
) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(quote_style)
        .from_writer(vec![]);
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn markdown(rows: &[Vec<String>]) -> String {
    let escape = |cell: &String| cell.replace('|', "\\|").replace('\n', "<br>");
    let line = |cells: Vec<String>| format!("| {} |\n", cells.join(" | "));

    let mut out = String::new();
    let mut rows = rows.iter();
    if let Some(header) = rows.next() {
        out.push_str(&line(header.iter().map(escape).collect()));
        out.push_str(&line(vec!["---".to_string(); header.len()]));
    }
    for row in rows {
        out.push_str(&line(row.iter().map(escape).collect()));
    }
    out
}

#[derive(Serialize)]
struct JsonRow<'a> {
    email: Option<&'a str>,
    created_at: DateTime<Utc>,
    answers: &'a Answers,
}

fn json<S: Response>(submissions: &[S]) -> Result<String, ExportError> {
    let rows: Vec<JsonRow> = submissions
        .iter()
        .map(|submission| JsonRow {
            email: submission.email(),
            created_at: submission.created_at(),
            answers: submission.answers(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::json;

    use super::*;
    use crate::model::{
        db::{form::NewForm, submission::SubmissionCore},
        mongodb::Id,
    };

    fn fixtures() -> (Vec<Question>, Vec<SubmissionCore>) {
        let form_id = Id::new();
        (
            NewForm::example().questions,
            vec![
                SubmissionCore::example1(form_id),
                SubmissionCore::example2(form_id),
            ],
        )
    }

    #[test]
    fn columns_skip_email_questions() {
        let (questions, submissions) = fixtures();
        let rows = rows(&questions, &submissions);

        assert_eq!(
            rows[0],
            vec![
                "Email",
                "Submitted At",
                "Favourite colour?",
                "What do you enjoy?",
                "Anything else?"
            ]
        );
        assert_eq!(
            rows[1],
            vec!["ada@example.com", "2024-03-01", "red", "sports, music", ""]
        );
        assert_eq!(
            rows[2],
            vec!["Anonymous", "2024-03-01", "blue", "music", "More events please"]
        );
    }

    #[test]
    fn csv_quotes_everything() {
        let (questions, mut submissions) = fixtures();
        submissions[1].answers.insert(
            "comments".to_string(),
            Some(serde_json::from_value(json!("Say \"hi\", please")).unwrap()),
        );
        let csv = export(&questions, &submissions, ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            r#""Email","Submitted At","Favourite colour?","What do you enjoy?","Anything else?""#
        );
        assert_eq!(
            lines[1],
            r#""ada@example.com","2024-03-01","red","sports, music","""#
        );
        assert_eq!(
            lines[2],
            r#""Anonymous","2024-03-01","blue","music","Say ""hi"", please""#
        );
    }

    #[test]
    fn tsv() {
        let (questions, submissions) = fixtures();
        let tsv = export(&questions, &submissions, ExportFormat::Tsv).unwrap();
        assert_eq!(
            tsv.lines().nth(1).unwrap(),
            "ada@example.com\t2024-03-01\tred\tsports, music\t"
        );
    }

    #[test]
    fn markdown_table() {
        let (questions, mut submissions) = fixtures();
        submissions[0].answers.insert(
            "comments".to_string(),
            Some(serde_json::from_value(json!("a|b")).unwrap()),
        );
        let md = export(&questions, &submissions, ExportFormat::Markdown).unwrap();
        let lines: Vec<&str> = md.lines().collect();

        assert_eq!(
            lines[0],
            "| Email | Submitted At | Favourite colour? | What do you enjoy? | Anything else? |"
        );
        assert_eq!(lines[1], "| --- | --- | --- | --- | --- |");
        assert_eq!(
            lines[2],
            "| ada@example.com | 2024-03-01 | red | sports, music | a\\|b |"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn json_rows() {
        let (questions, submissions) = fixtures();
        let out = export(&questions, &submissions, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["email"], "ada@example.com");
        assert_eq!(value[0]["answers"]["hobbies"], json!(["sports", "music"]));
        assert_eq!(value[1]["email"], serde_json::Value::Null);
        assert_eq!(value[1]["created_at"], "2024-03-01T18:30:00Z");
    }

    #[test]
    fn no_submissions() {
        let (questions, _) = fixtures();
        let csv = export::<SubmissionCore>(&questions, &[], ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 1);
        let json = export::<SubmissionCore>(&questions, &[], ExportFormat::Json).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
