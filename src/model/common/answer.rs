use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// The answers of one submission, keyed by question ID. A `None` value is a recorded null.
pub type Answers = BTreeMap<String, Option<Answer>>;

/// A single answer value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Bool(bool),
    Number(f64),
}

impl Scalar {
    /// The text of this value, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Bool(b) => write!(f, "{b}"),
            // Whole numbers render without a trailing `.0`.
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// The answer to one question: either one value or a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Multiple(Vec<Scalar>),
    Single(Scalar),
}

impl Answer {
    /// All values in this answer, in order.
    pub fn values(&self) -> &[Scalar] {
        match self {
            Self::Multiple(values) => values,
            Self::Single(value) => std::slice::from_ref(value),
        }
    }

    /// Whether this answer counts as a response: not empty text and not an empty list.
    pub fn is_admissible(&self) -> bool {
        match self {
            Self::Single(Scalar::Text(text)) => !text.is_empty(),
            Self::Single(_) => true,
            Self::Multiple(values) => !values.is_empty(),
        }
    }
}

/// Renders a list by joining its values with `", "`.
impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(value) => write!(f, "{value}"),
            Self::Multiple(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

/// Look up an admissible answer to the given question.
pub fn admissible<'a>(answers: &'a Answers, question_id: &str) -> Option<&'a Answer> {
    answers
        .get(question_id)
        .and_then(Option::as_ref)
        .filter(|answer| answer.is_admissible())
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn parse_answers() {
        let answers: Answers = serde_json::from_value(json!({
            "color": "red",
            "hobbies": ["sports", "music"],
            "age": 30,
            "agree": true,
            "skipped": null,
        }))
        .unwrap();

        assert_eq!(answers["color"], Some(Answer::Single("red".into())));
        assert_eq!(
            answers["hobbies"],
            Some(Answer::Multiple(vec!["sports".into(), "music".into()]))
        );
        assert_eq!(answers["age"], Some(Answer::Single(Scalar::Number(30.0))));
        assert_eq!(answers["agree"], Some(Answer::Single(Scalar::Bool(true))));
        assert_eq!(answers["skipped"], None);
    }

    #[test]
    fn admissibility() {
        let answers: Answers = serde_json::from_value(json!({
            "a": "x",
            "b": "",
            "c": [],
            "d": null,
            "e": 0,
            "f": [""],
        }))
        .unwrap();

        assert!(admissible(&answers, "a").is_some());
        assert!(admissible(&answers, "b").is_none());
        assert!(admissible(&answers, "c").is_none());
        assert!(admissible(&answers, "d").is_none());
        assert!(admissible(&answers, "e").is_some());
        assert!(admissible(&answers, "f").is_some());
        assert!(admissible(&answers, "missing").is_none());
    }

    #[test]
    fn display() {
        let answer = Answer::Multiple(vec!["a".into(), Scalar::Number(2.0), Scalar::Bool(false)]);
        assert_eq!(answer.to_string(), "a, 2, false");
        assert_eq!(Answer::Single(Scalar::Number(2.5)).to_string(), "2.5");
        assert_eq!(Answer::Multiple(vec![]).to_string(), "");
    }
}
