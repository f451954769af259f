use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime, Bson, Document},
    error::Error as DbError,
};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{answer::Answers, range::DateRange},
    mongodb::{Coll, Id},
};

/// Core submission data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionCore {
    pub form_id: Id,
    /// Respondent email, lowercased. A form accepts at most one submission per email.
    pub email: Option<String>,
    pub answers: Answers,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl SubmissionCore {
    /// A filter matching the submissions of a form within a date range.
    pub fn filter(form_id: Id, range: &DateRange) -> Document {
        let mut filter = doc! { "form_id": form_id };
        if let Some(created_at) = range.created_at_filter() {
            filter.extend(created_at);
        }
        filter
    }
}

/// Count the submissions of every form that has any.
pub async fn response_counts(submissions: &Coll<Submission>) -> Result<HashMap<Id, u64>, DbError> {
    let pipeline = [doc! { "$group": { "_id": "$form_id", "count": { "$sum": 1 } } }];
    let groups: Vec<Document> = submissions.aggregate(pipeline, None).await?.try_collect().await?;

    let counts = groups
        .into_iter()
        .filter_map(|group| {
            let form_id = group.get_object_id("_id").ok()?;
            let count = match group.get("count")? {
                Bson::Int32(n) => u64::try_from(*n).ok()?,
                Bson::Int64(n) => u64::try_from(*n).ok()?,
                _ => return None,
            };
            Some((Id::from(form_id), count))
        })
        .collect();
    Ok(counts)
}

/// A submission without an ID.
pub type NewSubmission = SubmissionCore;

/// A submission from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub submission: SubmissionCore,
}

impl Deref for Submission {
    type Target = SubmissionCore;

    fn deref(&self) -> &Self::Target {
        &self.submission
    }
}

impl DerefMut for Submission {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.submission
    }
}
