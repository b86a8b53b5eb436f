//! User service
//!
//! Implements business logic for users and their pets:
//! - Create users, optionally placed in an existing household
//! - Update name and email, delete users
//! - Adopt a single pet or add a batch of pets to a user
//! - List a user's pets
//!
//! Every operation that names a user, pet or household checks that it exists
//! first and reports `NotFound` (or a validation error for `household_id`)
//! instead of letting a foreign key failure surface as an internal error.

use crate::db::repositories::{HouseholdRepository, PetRepository, UserRepository};
use crate::models::{NewUser, Pet, UpdateUser, User};
use crate::schema::ValidationErrors;
use anyhow::Context;
use std::sync::Arc;

/// Validation message for a `household_id` that names no household
pub const UNKNOWN_HOUSEHOLD: &str = "Household does not exist.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// User or pet not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input was well-formed but refers to something invalid
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Result of linking one pet to one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adoption {
    pub user: User,
    pub pet: Pet,
    /// False when the pair was already linked
    pub newly_linked: bool,
}

impl Adoption {
    pub fn message(&self) -> String {
        format!(
            "{} adopted the {}, {}!",
            self.user.name, self.pet.animal, self.pet.name
        )
    }
}

/// User service
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    pets: Arc<dyn PetRepository>,
    households: Arc<dyn HouseholdRepository>,
}

impl UserService {
    /// Create a new user service
    ///
    /// # Arguments
    /// * `repo` - User repository, also owning the user/pet links
    /// * `pets` - Pet repository, for existence checks
    /// * `households` - Household repository, for existence checks
    pub fn new(
        repo: Arc<dyn UserRepository>,
        pets: Arc<dyn PetRepository>,
        households: Arc<dyn HouseholdRepository>,
    ) -> Self {
        Self {
            repo,
            pets,
            households,
        }
    }

    /// Create a user
    ///
    /// # Errors
    /// - `Validation` keyed `household_id` if the household does not exist
    /// - `InternalError` for database errors
    pub async fn create(&self, input: NewUser) -> Result<User, UserServiceError> {
        if let Some(household_id) = input.household_id {
            let household = self
                .households
                .get_by_id(household_id)
                .await
                .context("Failed to check household")?;
            if household.is_none() {
                return Err(UserServiceError::Validation(ValidationErrors::single(
                    "household_id",
                    UNKNOWN_HOUSEHOLD,
                )));
            }
        }

        let user = self
            .repo
            .create(&input)
            .await
            .context("Failed to create user")?;
        tracing::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")
            .map_err(Into::into)
    }

    /// All users in creation order
    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list users")
            .map_err(Into::into)
    }

    /// Replace name and email of an existing user
    ///
    /// Id, household and pet links are left untouched.
    pub async fn update(&self, id: i64, input: UpdateUser) -> Result<User, UserServiceError> {
        let mut user = self.require_user(id).await?;
        user.apply(input);

        let updated = self
            .repo
            .update(&user)
            .await
            .context("Failed to update user")?;
        tracing::info!("Updated user {}", id);
        Ok(updated)
    }

    /// Delete a user and its pet links. Pets themselves are kept.
    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete user")?;
        if !deleted {
            return Err(not_found("User", id));
        }

        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Link one pet to a user. Linking an already linked pair succeeds.
    pub async fn adopt(&self, user_id: i64, pet_id: i64) -> Result<Adoption, UserServiceError> {
        let user = self.require_user(user_id).await?;
        let pet = self
            .pets
            .get_by_id(pet_id)
            .await
            .context("Failed to get pet by ID")?
            .ok_or_else(|| not_found("Pet", pet_id))?;

        let newly_linked = self
            .repo
            .add_pet(user_id, pet_id)
            .await
            .context("Failed to link pet")?;
        if newly_linked {
            tracing::info!("User {} adopted pet {}", user_id, pet_id);
        } else {
            tracing::debug!("Pet {} already linked to user {}", pet_id, user_id);
        }

        Ok(Adoption {
            user,
            pet,
            newly_linked,
        })
    }

    /// Link every pet in `pet_ids` to a user, or none of them
    ///
    /// # Returns
    /// The number of links that did not exist before
    ///
    /// # Errors
    /// - `NotFound` if the user or any pet is absent; nothing is linked
    /// - `InternalError` for database errors
    pub async fn add_pets(&self, user_id: i64, pet_ids: &[i64]) -> Result<usize, UserServiceError> {
        self.require_user(user_id).await?;

        let missing = self
            .pets
            .missing_ids(pet_ids)
            .await
            .context("Failed to check pets")?;
        if !missing.is_empty() {
            let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(UserServiceError::NotFound(format!(
                "Pet not found: {}",
                ids.join(", ")
            )));
        }

        let added = self
            .repo
            .add_pets(user_id, pet_ids)
            .await
            .context("Failed to link pets")?;
        tracing::info!(
            "Linked {} new pet(s) to user {} ({} requested)",
            added,
            user_id,
            pet_ids.len()
        );
        Ok(added)
    }

    /// Pets of a user ordered by pet id
    pub async fn pets(&self, user_id: i64) -> Result<Vec<Pet>, UserServiceError> {
        self.require_user(user_id).await?;

        self.repo
            .list_pets(user_id)
            .await
            .context("Failed to list pets of user")
            .map_err(Into::into)
    }

    async fn require_user(&self, id: i64) -> Result<User, UserServiceError> {
        self.get_by_id(id).await?.ok_or_else(|| not_found("User", id))
    }
}

fn not_found(kind: &str, id: i64) -> UserServiceError {
    UserServiceError::NotFound(format!("{} not found: {}", kind, id))
}
