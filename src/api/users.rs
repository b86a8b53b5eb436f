//! User API endpoints
//!
//! - POST   /users                          - Create user
//! - GET    /users                          - List users
//! - GET    /users/{id}                     - Get user
//! - PUT    /users/{id}                     - Update name and email
//! - DELETE /users/{id}                     - Delete user
//! - GET    /users/{id}/add_pet/{pet_id}    - Adopt one pet
//! - POST   /users/{id}/add_pets            - Adopt a batch of pets
//! - GET    /users/my-pets/{id}             - List a user's pets

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, IdPath, Payload};
use crate::api::responses::{MessageResponse, PetResponse, UserResponse};
use crate::models::{NewUser, UpdateUser};
use crate::schema::PetIds;
use crate::services::UserServiceError;

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/add_pet/{pet_id}", get(add_pet))
        .route("/{id}/add_pets", post(add_pets))
        .route("/my-pets/{id}", get(my_pets))
}

/// Update and delete report a missing user as a bad request
fn invalid_user_id(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::NotFound(_) => ApiError::bad_request("Invalid user id"),
        other => other.into(),
    }
}

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    Payload(input): Payload<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.user_service.list().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;

    Ok(Json(user.into()))
}

/// PUT /users/{id}
///
/// The body is validated before the user is looked up.
async fn update_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
    Payload(input): Payload<UpdateUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .update(id, input)
        .await
        .map_err(invalid_user_id)?;

    Ok(Json(user.into()))
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .delete(id)
        .await
        .map_err(invalid_user_id)?;

    Ok(Json(MessageResponse::new(format!(
        "Successfully deleted user {}",
        id
    ))))
}

/// GET /users/{id}/add_pet/{pet_id}
async fn add_pet(
    State(state): State<AppState>,
    IdPath((id, pet_id)): IdPath<(i64, i64)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let adoption = state.user_service.adopt(id, pet_id).await?;
    Ok(Json(MessageResponse::new(adoption.message())))
}

/// POST /users/{id}/add_pets
async fn add_pets(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
    Payload(input): Payload<PetIds>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.add_pets(id, &input.pet_ids).await?;
    Ok(Json(MessageResponse::new("All pets added!")))
}

/// GET /users/my-pets/{id}
async fn my_pets(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let pets = state.user_service.pets(id).await?;
    Ok(Json(pets.into_iter().map(Into::into).collect()))
}
