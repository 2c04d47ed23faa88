// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::StatusResponse;
use crate::services::membership::MembershipError;
use crate::services::relay::RelayError;

/// Errors surfaced over HTTP as `{ "message": ... }` with a status code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Upstream(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(StatusResponse::new(self.to_string()))).into_response()
    }
}

impl From<MembershipError> for AppError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::Empty => AppError::BadRequest("Nickname is required".to_string()),
            MembershipError::Taken(_) => {
                AppError::BadRequest("Nickname is already in use".to_string())
            }
        }
    }
}

impl From<RelayError> for AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::MissingField => {
                AppError::BadRequest("Error: sender and text are required".to_string())
            }
            // Upstream details stay in the server log.
            RelayError::Upstream(_) => {
                AppError::Upstream("Failed to reach the generative model".to_string())
            }
        }
    }
}
