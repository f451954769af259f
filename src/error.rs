use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, Request};
use thiserror::Error;

use crate::export::ExportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An error with an explicit HTTP status and a human-readable reason.
    #[error("{0}: {1}")]
    Status(Status, String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl Error {
    /// A 404 for the described resource.
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// A 400 with the given reason.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, reason.into())
    }

    /// The status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            Self::Status(status, _) => *status,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Db(_) | Self::Argon2(_) | Self::Export(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        Err(status)
    }
}
