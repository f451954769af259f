//! Turns submitted answers into chart-ready datasets.
//!
//! Everything here is pure: callers fetch forms and submissions first, then hand
//! the resolved data over. Nothing in this module can fail.

use chrono::{DateTime, Utc};

use crate::model::{
    api::submission::SubmissionDescription,
    common::answer::Answers,
    db::submission::{Submission, SubmissionCore},
};

mod answers;
mod dashboard;
mod dataset;
mod decode;
mod trend;

pub use answers::aggregate;
pub use dashboard::{dashboard, rank_forms, FORM_COMPARISON_LIMIT};
pub use dataset::{ChartDataset, ChartKind};
pub use decode::decode_entities;
pub use trend::{trend, TREND_QUESTION_ID, TREND_WINDOW};

/// A submitted set of answers.
pub trait Response {
    fn answers(&self) -> &Answers;
    fn created_at(&self) -> DateTime<Utc>;
    /// The respondent's email, if they gave one.
    fn email(&self) -> Option<&str>;
}

impl Response for SubmissionCore {
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

impl Response for Submission {
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

impl Response for SubmissionDescription {
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
