use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    admin::{Admin, NewAdmin},
    form::{Form, NewForm},
    submission::{NewSubmission, Submission},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// No `T: Clone` bound, unlike `#[derive(Clone)]`.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

/// Name the collection that stores each of the given document types.
macro_rules! stored_in {
    ($name:literal: $($ty:ty),+) => {
        $(impl MongoCollection for $ty {
            const NAME: &'static str = $name;
        })+
    };
}

stored_in!("admins": Admin, NewAdmin);
stored_in!("forms": Form, NewForm);
stored_in!("submissions": Submission, NewSubmission);

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Admin collection.
    let admin_index = IndexModel::builder()
        .keys(doc! {"username": 1})
        .options(unique)
        .build();
    Coll::<Admin>::from_db(db)
        .create_index(admin_index, None)
        .await?;

    // Form collection: slugs are optional, but unique when present.
    let slug_options = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"custom_slug": {"$type": "string"}})
        .build();
    let slug_index = IndexModel::builder()
        .keys(doc! {"custom_slug": 1})
        .options(slug_options)
        .build();
    Coll::<Form>::from_db(db)
        .create_index(slug_index, None)
        .await?;

    // Submission collection: listing order, and one submission per respondent email.
    let listing_index = IndexModel::builder()
        .keys(doc! {"form_id": 1, "created_at": -1})
        .build();
    let email_options = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"email": {"$type": "string"}})
        .build();
    let email_index = IndexModel::builder()
        .keys(doc! {"form_id": 1, "email": 1})
        .options(email_options)
        .build();
    Coll::<Submission>::from_db(db)
        .create_indexes([listing_index, email_index], None)
        .await?;

    Ok(())
}
