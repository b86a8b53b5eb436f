//! Household service
//!
//! Creates and lists households, and resolves the residents of one.

use crate::db::repositories::{HouseholdRepository, UserRepository};
use crate::models::{Household, NewHousehold, User};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct HouseholdService {
    repo: Arc<dyn HouseholdRepository>,
    users: Arc<dyn UserRepository>,
}

impl HouseholdService {
    pub fn new(repo: Arc<dyn HouseholdRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repo, users }
    }

    pub async fn create(&self, input: NewHousehold) -> Result<Household> {
        let household = self
            .repo
            .create(&input)
            .await
            .context("Failed to create household")?;
        tracing::info!("Created household {} at {}", household.id, household.address);
        Ok(household)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Household>> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get household by ID")
    }

    pub async fn list(&self) -> Result<Vec<Household>> {
        self.repo.list().await.context("Failed to list households")
    }

    /// Users living in the household, or `None` if the household does not exist
    pub async fn residents(&self, id: i64) -> Result<Option<Vec<User>>> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let residents = self
            .users
            .list_by_household(id)
            .await
            .context("Failed to list residents")?;
        Ok(Some(residents))
    }
}
