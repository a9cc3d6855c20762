use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::repo;

/// Errors surfaced to HTTP clients
///
/// Messages are shown to the client as plain text, so internal failures are
/// logged and reported as a generic "Application error".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Page not found")]
    NotFound,
    #[error("Not authorized")]
    Unauthorized,
    #[error(transparent)]
    Repo(#[from] repo::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::Repo(repo::Error::NotFound) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Repo(repo::Error::Validation(..)) => StatusCode::BAD_REQUEST,
            Self::Repo(repo::Error::Persistence(..)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Repo(repo::Error::NotFound) => "Page not found".to_string(),
            Self::Repo(repo::Error::Persistence(e)) => {
                tracing::error!("Request failed: {}", e);
                "Application error".to_string()
            }
            other => other.to_string(),
        };

        (status, message).into_response()
    }
}
