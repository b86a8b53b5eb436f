//! Pet API endpoints
//!
//! - POST /pets       - Create pet
//! - GET  /pets       - List pets
//! - GET  /pets/{id}  - Get pet

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, IdPath, Payload};
use crate::api::responses::PetResponse;
use crate::models::NewPet;

/// Build the pets router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_pet).get(list_pets))
        .route("/{id}", get(get_pet))
}

async fn create_pet(
    State(state): State<AppState>,
    Payload(input): Payload<NewPet>,
) -> Result<(StatusCode, Json<PetResponse>), ApiError> {
    let pet = state.pet_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(pet.into())))
}

async fn list_pets(State(state): State<AppState>) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let pets = state.pet_service.list().await?;
    Ok(Json(pets.into_iter().map(Into::into).collect()))
}

async fn get_pet(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<PetResponse>, ApiError> {
    let pet = state
        .pet_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Pet not found: {}", id)))?;

    Ok(Json(pet.into()))
}
