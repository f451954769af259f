use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use rocket::form::{self, prelude::ErrorKind, FromFormField, ValueField};

/// An RFC 3339 timestamp received as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Utc>);

impl Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for Timestamp {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        DateTime::parse_from_rfc3339(field.value)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|err| ErrorKind::Custom(Box::new(err)).into())
    }
}

/// An optional, inclusive window on submission time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromForm)]
pub struct DateRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self {
            from: from.map(Timestamp),
            to: to.map(Timestamp),
        }
    }

    /// Whether the given instant falls inside this range.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| instant >= *from) && self.to.map_or(true, |to| instant <= *to)
    }

    /// A filter on the `created_at` field, or `None` if the range is unbounded.
    pub fn created_at_filter(&self) -> Option<Document> {
        let mut bounds = Document::new();
        if let Some(from) = self.from {
            bounds.insert("$gte", BsonDateTime::from_chrono(*from));
        }
        if let Some(to) = self.to {
            bounds.insert("$lte", BsonDateTime::from_chrono(*to));
        }
        (!bounds.is_empty()).then(|| doc! { "created_at": bounds })
    }
}
