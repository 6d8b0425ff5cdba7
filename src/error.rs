use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::actor::ActorId;
use crate::models::request::{RequestId, RequestStatus};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("request {0} not found")]
    NotFound(RequestId),

    #[error("request {0} was already taken by another volunteer")]
    AlreadyAssigned(RequestId),

    #[error("request {id} is {from}; cannot {action}")]
    InvalidTransition {
        id: RequestId,
        from: RequestStatus,
        action: &'static str,
    },

    #[error("invalid actor: {0}")]
    InvalidActor(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable identifier clients switch on.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ActorNotFound(_) => "actor_not_found",
            AppError::InvalidCoordinate(_) => "invalid_coordinate",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyAssigned(_) => "already_assigned",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::InvalidActor(_) => "invalid_actor",
            AppError::BadRequest(_) => "bad_request",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ActorNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCoordinate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AlreadyAssigned(_) | AppError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            AppError::InvalidActor(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}
