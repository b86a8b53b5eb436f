//! Pet service

use crate::db::repositories::PetRepository;
use crate::models::{NewPet, Pet};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct PetService {
    repo: Arc<dyn PetRepository>,
}

impl PetService {
    pub fn new(repo: Arc<dyn PetRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: NewPet) -> Result<Pet> {
        let pet = self.repo.create(&input).await.context("Failed to create pet")?;
        tracing::info!("Created pet {} ({}, {})", pet.id, pet.name, pet.animal);
        Ok(pet)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Pet>> {
        self.repo.get_by_id(id).await.context("Failed to get pet by ID")
    }

    pub async fn list(&self) -> Result<Vec<Pet>> {
        self.repo.list().await.context("Failed to list pets")
    }
}
