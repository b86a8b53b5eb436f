//! Household API endpoints
//!
//! - POST /house_holds                  - Create household
//! - GET  /house_holds                  - List households
//! - GET  /house_holds/{id}             - Get household
//! - GET  /house_holds/{id}/residents   - List users living there

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, IdPath, Payload};
use crate::api::responses::{HouseholdResponse, UserResponse};
use crate::models::NewHousehold;

/// Build the households router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_household).get(list_households))
        .route("/{id}", get(get_household))
        .route("/{id}/residents", get(list_residents))
}

async fn create_household(
    State(state): State<AppState>,
    Payload(input): Payload<NewHousehold>,
) -> Result<(StatusCode, Json<HouseholdResponse>), ApiError> {
    let household = state.household_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(household.into())))
}

async fn list_households(
    State(state): State<AppState>,
) -> Result<Json<Vec<HouseholdResponse>>, ApiError> {
    let households = state.household_service.list().await?;
    Ok(Json(households.into_iter().map(Into::into).collect()))
}

async fn get_household(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<HouseholdResponse>, ApiError> {
    let household = state
        .household_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Household not found: {}", id)))?;

    Ok(Json(household.into()))
}

async fn list_residents(
    State(state): State<AppState>,
    IdPath(id): IdPath<i64>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let residents = state
        .household_service
        .residents(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Household not found: {}", id)))?;

    Ok(Json(residents.into_iter().map(Into::into).collect()))
}
