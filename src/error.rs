use std::fmt::Display;

use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    OidParse(#[from] mongodb::bson::oid::Error),
    #[error("{0}: {1}")]
    Status(Status, String),
}

impl Error {
    /// A 404 error for the given resource.
    pub fn not_found(what: impl Display) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what))
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match &self {
            Self::Status(status, _) => *status,
            Self::OidParse(_) => Status::BadRequest,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Db(_) => Status::InternalServerError,
        };
        if status.code >= 500 {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        Err(status)
    }
}
