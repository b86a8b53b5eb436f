//! API layer - HTTP handlers and routing
//!
//! - User endpoints, including pet adoption
//! - Pet endpoints
//! - Household endpoints
//! - Health check

pub mod common;
pub mod households;
pub mod middleware;
pub mod pets;
pub mod responses;
pub mod users;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, Payload};

/// Build the API routes
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/pets", pets::router())
        .nest("/house_holds", households::router())
        .route("/health", get(common::health))
}

/// Build the complete router with middleware
///
/// `cors_origin` is a single origin, or `*` to allow any.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = if cors_origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let value = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
        AllowOrigin::exact(value)
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(build_api_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::responses::{HouseholdResponse, MessageResponse, PetResponse, UserResponse};
    use crate::db::{create_test_pool, migrations};
    use axum::{body::Bytes, http::StatusCode};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    async fn setup_test_server() -> TestServer {
        let pool = create_test_pool()
            .await
            .expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let app = build_router(AppState::new(pool), "http://localhost:3000")
            .expect("Failed to build router");
        TestServer::new(app).expect("Failed to start test server")
    }

    async fn create_user(server: &TestServer, name: &str, email: &str) -> UserResponse {
        let response = server
            .post("/users")
            .json(&json!({"name": name, "email": email}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn create_pet(server: &TestServer, name: &str, animal: &str) -> PetResponse {
        let response = server
            .post("/pets")
            .json(&json!({"name": name, "animal": animal}))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    // ========================================================================
    // Users
    // ========================================================================

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let server = setup_test_server().await;

        let created = create_user(&server, "Ana", "ana@example.com").await;
        let fetched: UserResponse = server.get(&format!("/users/{}", created.id)).await.json();

        assert!(created.id > 0);
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Ana");
        assert_eq!(fetched.email, "ana@example.com");
        assert_eq!(fetched.household_id, None);
    }

    #[tokio::test]
    async fn test_create_user_missing_name() {
        let server = setup_test_server().await;

        let response = server
            .post("/users")
            .json(&json!({"email": "ana@example.com"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"name": ["Missing data for required field."]}));
        let users: Vec<UserResponse> = server.get("/users").await.json();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_reports_every_field() {
        let server = setup_test_server().await;

        let response = server
            .post("/users")
            .json(&json!({"name": "x".repeat(51), "email": 7, "nickname": "a"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["name"], json!(["Longer than maximum length 50."]));
        assert_eq!(body["email"], json!(["Not a valid string."]));
        assert_eq!(body["nickname"], json!(["Unknown field."]));
    }

    #[tokio::test]
    async fn test_non_object_body() {
        let server = setup_test_server().await;

        let response = server.post("/pets").json(&json!(["Rex", "dog"])).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"_schema": ["Invalid input type."]}));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let server = setup_test_server().await;

        let response = server
            .post("/users")
            .bytes(Bytes::from_static(b"{\"name\": "))
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let server = setup_test_server().await;

        let response = server.post("/pets").text(r#"{"name":"Rex","animal":"dog"}"#).await;

        assert!(response.status_code().is_client_error());
        let pets: Vec<PetResponse> = server.get("/pets").await.json();
        assert!(pets.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_unknown_household() {
        let server = setup_test_server().await;

        let response = server
            .post("/users")
            .json(&json!({"name": "Ana", "email": "ana@example.com", "household_id": 40}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"household_id": ["Household does not exist."]}));
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let server = setup_test_server().await;

        let response = server.get("/users/12345").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_users() {
        let server = setup_test_server().await;
        let ana = create_user(&server, "Ana", "ana@example.com").await;
        let bo = create_user(&server, "Bo", "bo@example.com").await;

        let users: Vec<UserResponse> = server.get("/users").await.json();

        assert_eq!(users, vec![ana, bo]);
    }

    #[tokio::test]
    async fn test_update_user_keeps_id_and_pets() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;
        let pet = create_pet(&server, "Rex", "dog").await;
        server
            .get(&format!("/users/{}/add_pet/{}", user.id, pet.id))
            .await
            .assert_status_ok();

        let response = server
            .put(&format!("/users/{}", user.id))
            .json(&json!({"name": "Ana Maria", "email": "am@example.com"}))
            .await;

        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.email, "am@example.com");
        let pets: Vec<PetResponse> = server.get(&format!("/users/my-pets/{}", user.id)).await.json();
        assert_eq!(pets, vec![pet]);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let server = setup_test_server().await;

        let response = server
            .put("/users/999")
            .json(&json!({"name": "Ana", "email": "ana@example.com"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Invalid user id");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_body() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;

        let response = server
            .put(&format!("/users/{}", user.id))
            .json(&json!({"name": "Ana", "email": null}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"email": ["Field may not be null."]}));
    }

    #[tokio::test]
    async fn test_put_back_fetched_user() {
        let server = setup_test_server().await;
        let household: HouseholdResponse = server
            .post("/house_holds")
            .json(&json!({
                "address": "1 Elm St",
                "residence_type": "house",
                "fenced_yard": true,
                "grass_access": true
            }))
            .await
            .json();
        let created: UserResponse = server
            .post("/users")
            .json(&json!({"name": "Ana", "email": "ana@example.com", "household_id": household.id}))
            .await
            .json();

        let mut body: Value = server.get(&format!("/users/{}", created.id)).await.json();
        body["name"] = json!("Ana Maria");
        let response = server.put(&format!("/users/{}", created.id)).json(&body).await;

        response.assert_status_ok();
        let updated: UserResponse = response.json();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.household_id, Some(household.id));
    }

    #[tokio::test]
    async fn test_create_ignores_client_id() {
        let server = setup_test_server().await;

        let response = server
            .post("/users")
            .json(&json!({"id": 99, "name": "B", "email": "b@x"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let user: UserResponse = response.json();
        assert_ne!(user.id, 99);
        assert_eq!(user.name, "B");
    }

    #[tokio::test]
    async fn test_update_missing_user_with_invalid_body() {
        let server = setup_test_server().await;

        let response = server
            .put("/users/999")
            .json(&json!({"name": "Ana"}))
            .await;

        // The body is checked before the user lookup.
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"email": ["Missing data for required field."]}));
    }

    #[tokio::test]
    async fn test_non_integer_path_ids() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;

        for path in [
            "/users/abc".to_string(),
            "/users/my-pets/abc".to_string(),
            format!("/users/{}/add_pet/rex", user.id),
            "/pets/1.5".to_string(),
            "/house_holds/home/residents".to_string(),
        ] {
            let response = server.get(&path).await;

            response.assert_status(StatusCode::NOT_FOUND);
            let body: Value = response.json();
            assert_eq!(body["error"]["code"], "NOT_FOUND", "path {}", path);
        }
        server
            .delete("/users/abc")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;

        let response = server.delete(&format!("/users/{}", user.id)).await;

        response.assert_status_ok();
        let message: MessageResponse = response.json();
        assert_eq!(message.message, format!("Successfully deleted user {}", user.id));
        server
            .get(&format!("/users/{}", user.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/users/{}", user.id))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    // ========================================================================
    // Adoption
    // ========================================================================

    #[tokio::test]
    async fn test_add_pet_twice_links_once() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;
        let pet = create_pet(&server, "Rex", "dog").await;
        let path = format!("/users/{}/add_pet/{}", user.id, pet.id);

        let first: MessageResponse = server.get(&path).await.json();
        let second = server.get(&path).await;

        assert_eq!(first.message, "Ana adopted the dog, Rex!");
        second.assert_status_ok();
        let pets: Vec<PetResponse> = server.get(&format!("/users/my-pets/{}", user.id)).await.json();
        assert_eq!(pets.len(), 1);
    }

    #[tokio::test]
    async fn test_add_pet_missing_entities() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;
        let pet = create_pet(&server, "Rex", "dog").await;

        server
            .get(&format!("/users/{}/add_pet/{}", user.id, pet.id + 10))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get(&format!("/users/{}/add_pet/{}", user.id + 10, pet.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_add_pets_with_invalid_id_links_nothing() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;
        let pet = create_pet(&server, "Rex", "dog").await;

        let response = server
            .post(&format!("/users/{}/add_pets", user.id))
            .json(&json!({"pet_ids": [pet.id, pet.id + 1000]}))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let pets: Vec<PetResponse> = server.get(&format!("/users/my-pets/{}", user.id)).await.json();
        assert!(pets.is_empty());
    }

    #[tokio::test]
    async fn test_add_pets_validation() {
        let server = setup_test_server().await;
        let user = create_user(&server, "Ana", "ana@example.com").await;

        let response = server
            .post(&format!("/users/{}/add_pets", user.id))
            .json(&json!({"pet_ids": "1,2"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body, json!({"pet_ids": ["Not a valid list."]}));
    }

    #[tokio::test]
    async fn test_my_pets_of_missing_user() {
        let server = setup_test_server().await;

        server
            .get("/users/my-pets/77")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // Pets and households
    // ========================================================================

    #[tokio::test]
    async fn test_pets_endpoints() {
        let server = setup_test_server().await;
        let pet = create_pet(&server, "Tom", "cat").await;

        let fetched: PetResponse = server.get(&format!("/pets/{}", pet.id)).await.json();
        let all: Vec<PetResponse> = server.get("/pets").await.json();

        assert_eq!(fetched, pet);
        assert_eq!(all, vec![pet]);
        server.get("/pets/500").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_household_requires_booleans() {
        let server = setup_test_server().await;

        let response = server
            .post("/house_holds")
            .json(&json!({
                "address": "1 Elm St",
                "residence_type": "house",
                "fenced_yard": "yes"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["fenced_yard"], json!(["Not a valid boolean."]));
        assert_eq!(body["grass_access"], json!(["Missing data for required field."]));
    }

    #[tokio::test]
    async fn test_household_residents() {
        let server = setup_test_server().await;
        let household: HouseholdResponse = server
            .post("/house_holds")
            .json(&json!({
                "address": "1 Elm St",
                "residence_type": "house",
                "fenced_yard": true,
                "grass_access": false
            }))
            .await
            .json();
        let ana: UserResponse = server
            .post("/users")
            .json(&json!({"name": "Ana", "email": "ana@example.com", "household_id": household.id}))
            .await
            .json();
        create_user(&server, "Bo", "bo@example.com").await;

        let fetched: HouseholdResponse = server
            .get(&format!("/house_holds/{}", household.id))
            .await
            .json();
        let residents: Vec<UserResponse> = server
            .get(&format!("/house_holds/{}/residents", household.id))
            .await
            .json();

        assert_eq!(fetched, household);
        assert!(fetched.fenced_yard);
        assert!(!fetched.grass_access);
        assert_eq!(residents, vec![ana]);
        server
            .get("/house_holds/404/residents")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_household_user_pets_scenario() {
        let server = setup_test_server().await;

        let household: HouseholdResponse = server
            .post("/house_holds")
            .json(&json!({
                "address": "22 Acacia Ave",
                "residence_type": "house",
                "fenced_yard": true,
                "grass_access": true
            }))
            .await
            .json();
        let user: UserResponse = server
            .post("/users")
            .json(&json!({"name": "Ana", "email": "ana@example.com", "household_id": household.id}))
            .await
            .json();
        let rex = create_pet(&server, "Rex", "dog").await;
        let tom = create_pet(&server, "Tom", "cat").await;

        let response = server
            .post(&format!("/users/{}/add_pets", user.id))
            .json(&json!({"pet_ids": [rex.id, tom.id]}))
            .await;
        response.assert_status_ok();
        let message: MessageResponse = response.json();
        assert_eq!(message.message, "All pets added!");

        let pets: Vec<PetResponse> = server.get(&format!("/users/my-pets/{}", user.id)).await.json();
        assert_eq!(pets, vec![rex, tom]);

        let households: Vec<HouseholdResponse> = server.get("/house_holds").await.json();
        assert_eq!(households, vec![household]);
    }

    #[tokio::test]
    async fn test_health() {
        let server = setup_test_server().await;

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_build_router_rejects_bad_origin() {
        let pool = create_test_pool().await.unwrap();

        assert!(build_router(AppState::new(pool.clone()), "bad\norigin").is_err());
        assert!(build_router(AppState::new(pool), "*").is_ok());
    }
}
