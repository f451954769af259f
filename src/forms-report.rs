//! A CLI tool for reporting on form responses offline.
//! This uses the server's own analytics and export code, and reads the files
//! that the question export and JSON response export endpoints produce.

use std::fs::File;
use std::io::BufReader;

use chrono::{DateTime, FixedOffset, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use forms_backend::{
    analytics::{dashboard, trend, ChartDataset, Response},
    export::{export, ExportFormat},
    model::{api::transfer::QuestionExport, common::answer::Answers},
};

const PROGRAM_NAME: &str = "forms-report";

const ABOUT_TEXT: &str = "Summarise the responses to a form.

Without `--format`, prints the chart datasets and submission trend as JSON.

EXIT CODES:
     0: Report printed.
     1: Error.";

const QUESTIONS_PATH: &str = "QUESTIONS_PATH";
const SUBMISSIONS_PATH: &str = "SUBMISSIONS_PATH";
const FORMAT: &str = "format";
const UTC_OFFSET: &str = "utc-offset";

const QUESTIONS_PATH_HELP: &str = "The path to a question export,\n\
as returned by `GET /forms/<id>/questions/export`";

const SUBMISSIONS_PATH_HELP: &str = "The path to a JSON response export,\n\
as returned by `GET /forms/<id>/submissions/export?format=json`";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(QUESTIONS_PATH)
                .help(QUESTIONS_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(SUBMISSIONS_PATH)
                .help(SUBMISSIONS_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(FORMAT)
                .long(FORMAT)
                .short('f')
                .help("Print an export instead: csv, tsv, markdown or json")
                .action(ArgAction::Set)
                .value_parser(|s: &str| s.parse::<ExportFormat>()),
        )
        .arg(
            Arg::new(UTC_OFFSET)
                .long(UTC_OFFSET)
                .help("Minutes east of UTC that trend days are counted in")
                .action(ArgAction::Set)
                .allow_hyphen_values(true)
                .default_value("0")
                .value_parser(value_parser!(i32).range(-1439..=1439)),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode one of the input files, or to render the output.
    Format(String),
}

/// One row of a JSON response export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Row {
    email: Option<String>,
    created_at: DateTime<Utc>,
    answers: Answers,
}

impl Response for Row {
    fn answers(&self) -> &Answers {
        &self.answers
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// The charts printed when no export format is requested.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Charts {
    form_name: String,
    total_submissions: u64,
    datasets: Vec<ChartDataset>,
    trend: ChartDataset,
}

fn load<T: DeserializeOwned>(path: &str) -> Result<T, Error> {
    let file = BufReader::new(File::open(path).map_err(|e| Error::IO(format!("{path}: {e}")))?);
    serde_json::from_reader(file).map_err(|e| Error::Format(format!("{path}: {e}")))
}

/// Build the report text.
fn report(
    questions_path: &str,
    submissions_path: &str,
    format: Option<ExportFormat>,
    offset: FixedOffset,
) -> Result<String, Error> {
    let question_export: QuestionExport = load(questions_path)?;
    let rows: Vec<Row> = load(submissions_path)?;
    let questions = question_export.questions();

    match format {
        Some(format) => {
            export(&questions, &rows, format).map_err(|e| Error::Format(e.to_string()))
        }
        None => {
            let charts = Charts {
                form_name: question_export.form_name,
                total_submissions: rows.len() as u64,
                datasets: dashboard(&questions, &rows),
                trend: trend(&rows, offset),
            };
            serde_json::to_string_pretty(&charts).map_err(|e| Error::Format(e.to_string()))
        }
    }
}

/// Build the report, print it, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    // Required and defaulted arguments are guaranteed to be present.
    let questions_path: &String = args.get_one(QUESTIONS_PATH).unwrap();
    let submissions_path: &String = args.get_one(SUBMISSIONS_PATH).unwrap();
    let format = args.get_one::<ExportFormat>(FORMAT).copied();
    let minutes: i32 = *args.get_one(UTC_OFFSET).unwrap();
    // Within range thanks to the argument parser.
    let offset = FixedOffset::east_opt(minutes * 60).unwrap();

    match report(questions_path, submissions_path, format, offset) {
        Ok(text) => {
            println!("{}", text.trim_end());
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid input: {}", msg);
            1
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::Value;

    use super::*;

    const QUESTIONS: &str = "example_dumps/questions.json";
    const SUBMISSIONS: &str = "example_dumps/submissions.json";

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn charts() {
        let text = report(QUESTIONS, SUBMISSIONS, None, utc()).unwrap();
        let charts: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(charts["formName"], "Club survey");
        assert_eq!(charts["totalSubmissions"], 3);
        let datasets = charts["datasets"].as_array().unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0]["questionId"], "color");
        assert_eq!(datasets[0]["labels"], serde_json::json!(["Red", "Blue"]));
        assert_eq!(datasets[0]["counts"], serde_json::json!([2, 1]));
        // The legacy value has no matching option, so it gets its own bucket.
        assert_eq!(
            datasets[1]["labels"],
            serde_json::json!(["Sports", "Music", "Rock & roll"])
        );
        assert_eq!(
            charts["trend"]["labels"],
            serde_json::json!(["2024-03-01", "2024-03-03"])
        );
    }

    #[test]
    fn trend_offset() {
        // 23:30 UTC on 2024-03-01 is already 2024-03-02 at UTC+1.
        let text = report(QUESTIONS, SUBMISSIONS, None, FixedOffset::east_opt(3600).unwrap())
            .unwrap();
        let charts: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            charts["trend"]["labels"],
            serde_json::json!(["2024-03-01", "2024-03-02", "2024-03-03"])
        );
    }

    #[test]
    fn exports() {
        let csv = report(QUESTIONS, SUBMISSIONS, Some(ExportFormat::Csv), utc()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            r#""Email","Submitted At","Favourite colour?","What do you enjoy?","Anything else?""#
        );
        assert!(lines[2].starts_with(r#""Anonymous","2024-03-01""#));

        let md = report(QUESTIONS, SUBMISSIONS, Some(ExportFormat::Markdown), utc()).unwrap();
        assert_eq!(md.lines().nth(1), Some("| --- | --- | --- | --- | --- |"));
    }

    #[test]
    fn bad_input() {
        assert!(matches!(
            report("not a real file", SUBMISSIONS, None, utc()),
            Err(Error::IO(_))
        ));
        assert!(matches!(
            report(QUESTIONS, "example_dumps/malformed.json", None, utc()),
            Err(Error::Format(_))
        ));
        // Files swapped.
        assert!(matches!(
            report(SUBMISSIONS, QUESTIONS, None, utc()),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn correct_cli_usage() {
        let command_line = [PROGRAM_NAME, QUESTIONS, SUBMISSIONS];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, QUESTIONS, SUBMISSIONS, "--format", "tsv"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(args.get_one::<ExportFormat>(FORMAT), Some(&ExportFormat::Tsv));
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, QUESTIONS, SUBMISSIONS, "--utc-offset", "-300"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, QUESTIONS, "example_dumps/malformed.json"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [PROGRAM_NAME, "not a real file", SUBMISSIONS];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);
    }

    #[test]
    fn bad_cli_usage() {
        // Missing the submissions file.
        let command_line = [PROGRAM_NAME, QUESTIONS];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Unknown format.
        let command_line = [PROGRAM_NAME, QUESTIONS, SUBMISSIONS, "--format", "xlsx"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Offset of more than a day.
        let command_line = [PROGRAM_NAME, QUESTIONS, SUBMISSIONS, "--utc-offset", "2000"];
        cli().try_get_matches_from(command_line).unwrap_err();
    }
}
