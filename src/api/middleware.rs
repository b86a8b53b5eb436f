//! Shared handler plumbing
//!
//! - `AppState` carried by every route
//! - `ApiError` and its JSON rendering
//! - `Payload<T>` extractor running a schema over the request body
//! - `IdPath<T>` extractor for integer path ids

use std::sync::Arc;

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::db::repositories::{SqlxHouseholdRepository, SqlxPetRepository, SqlxUserRepository};
use crate::db::DynDatabasePool;
use crate::schema::{Schema, ValidationErrors};
use crate::services::{HouseholdService, PetService, UserService, UserServiceError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub pet_service: Arc<PetService>,
    pub household_service: Arc<HouseholdService>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DynDatabasePool) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let pet_repo = SqlxPetRepository::boxed(pool.clone());
        let household_repo = SqlxHouseholdRepository::boxed(pool.clone());

        Self {
            user_service: Arc::new(UserService::new(
                user_repo.clone(),
                pet_repo.clone(),
                household_repo.clone(),
            )),
            pet_service: Arc::new(PetService::new(pet_repo)),
            household_service: Arc::new(HouseholdService::new(household_repo, user_repo)),
            pool,
        }
    }
}

/// Error body: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Errors returned by handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rendered as the bare field map, not the error envelope
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound(message) => ApiError::NotFound(message),
            UserServiceError::Validation(errors) => ApiError::Validation(errors),
            UserServiceError::InternalError(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Validation(errors) => {
                return (status, Json(errors.clone())).into_response();
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body validated by a [`Schema`]
///
/// Malformed JSON or a wrong content type is a `BadRequest`; a well-formed
/// body failing the schema is a `Validation` error.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: Schema + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        T::load(&value).map(Payload).map_err(ApiError::Validation)
    }
}

/// Integer path parameters
///
/// A segment that does not parse as an id matches no resource, so the
/// rejection is a `NotFound` in the usual error envelope.
#[derive(Debug)]
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let uri_path = parts.uri.path().to_string();

        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!("Unmatched path {}: {}", uri_path, rejection.body_text());
                Err(ApiError::not_found(format!("Not found: {}", uri_path)))
            }
        }
    }
}
