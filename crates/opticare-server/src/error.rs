//! HTTP error responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opticare_core::RepoError;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Repo(e) => match e {
                RepoError::Validation(_) => StatusCode::BAD_REQUEST,
                RepoError::NotFound(_) => StatusCode::NOT_FOUND,
                RepoError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                RepoError::LoadFailed(_) => StatusCode::GATEWAY_TIMEOUT,
                RepoError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                RepoError::Cancelled | RepoError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Repo(e) => e.user_message(),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Repo(e) if !e.is_user_visible() => debug!("Request cancelled: {}", e),
            _ if status.is_server_error() => error!("Request failed: {}", self),
            _ => debug!("Request rejected: {}", self),
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}
