use std::ops::Deref;

use mongodb::{
    bson::doc,
    error::{Error as DbError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    response::{Response, ResponseCore},
    survey::{Survey, SurveyCore},
    user::{User, UserCore},
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

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
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

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for UserCore {
    const NAME: &'static str = USERS;
}

// Survey collections
const SURVEYS: &str = "surveys";
impl MongoCollection for Survey {
    const NAME: &'static str = SURVEYS;
}
impl MongoCollection for SurveyCore {
    const NAME: &'static str = SURVEYS;
}

// Response collections
const RESPONSES: &str = "responses";
impl MongoCollection for Response {
    const NAME: &'static str = RESPONSES;
}
impl MongoCollection for ResponseCore {
    const NAME: &'static str = RESPONSES;
}

/// Server error code for a unique index violation. The driver only reports
/// write errors by numeric code, with no named constants.
pub const DUPLICATE_KEY: i32 = 11000;

/// Check a write result for a unique index violation, so callers can map it
/// to a domain-level conflict instead of a generic database error.
pub fn is_duplicate_key_error<T>(result: Result<T, &DbError>) -> bool {
    match result {
        Err(err) => matches!(
            &*err.kind,
            ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
        ),
        Ok(_) => false,
    }
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // User collection: one account per email address.
    let user_index = IndexModel::builder()
        .keys(doc! {"email": 1})
        .options(unique)
        .build();
    Coll::<User>::from_db(db)
        .create_index(user_index, None)
        .await?;

    // Response collection: at most one response per survey per identified
    // user. The partial filter leaves anonymous responses (no `user_id`)
    // out of the constraint entirely.
    let identified_only = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"user_id": {"$type": "objectId"}})
        .build();
    let response_index = IndexModel::builder()
        .keys(doc! {"survey_id": 1, "user_id": 1})
        .options(identified_only)
        .build();
    Coll::<Response>::from_db(db)
        .create_index(response_index, None)
        .await?;

    // Survey collection: listing sorts by creation time.
    let survey_index = IndexModel::builder()
        .keys(doc! {"created_at": -1})
        .build();
    Coll::<Survey>::from_db(db)
        .create_index(survey_index, None)
        .await?;

    Ok(())
}
