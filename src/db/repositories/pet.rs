//! Pet repository
//!
//! - `PetRepository` trait defining pet data access
//! - `SqlxPetRepository` implementing it for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::{NewPet, Pet};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;

#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Insert a pet and return it with its assigned id
    async fn create(&self, pet: &NewPet) -> Result<Pet>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>>;

    /// All pets in insertion order
    async fn list(&self) -> Result<Vec<Pet>>;

    /// Ids from `ids` that have no pet row, in the order given
    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

pub struct SqlxPetRepository {
    pool: DynDatabasePool,
}

impl SqlxPetRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PetRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PetRepository for SqlxPetRepository {
    async fn create(&self, pet: &NewPet) -> Result<Pet> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_pet_sqlite(pool, pet).await,
            Backend::Mysql(pool) => create_pet_mysql(pool, pet).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Pet>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_pet_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_pet_by_id_mysql(pool, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Pet>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_pets_sqlite(pool).await,
            Backend::Mysql(pool) => list_pets_mysql(pool).await,
        }
    }

    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        let mut seen = HashSet::new();
        let requested: Vec<i64> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut found = HashSet::new();
        for chunk in requested.chunks(ID_CHUNK_SIZE) {
            let existing = match self.pool.backend() {
                Backend::Sqlite(pool) => existing_pet_ids_sqlite(pool, chunk).await?,
                Backend::Mysql(pool) => existing_pet_ids_mysql(pool, chunk).await?,
            };
            found.extend(existing);
        }

        Ok(requested.into_iter().filter(|id| !found.contains(id)).collect())
    }
}

/// Ids per `IN (...)` lookup, well under the bind limits of both backends
const ID_CHUNK_SIZE: usize = 500;

fn select_existing_ids_sql(count: usize) -> String {
    format!(
        "SELECT id FROM pets WHERE id IN ({})",
        vec!["?"; count].join(", ")
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_pet_sqlite(pool: &SqlitePool, pet: &NewPet) -> Result<Pet> {
    let result = sqlx::query("INSERT INTO pets (name, animal) VALUES (?, ?)")
        .bind(&pet.name)
        .bind(&pet.animal)
        .execute(pool)
        .await
        .context("Failed to create pet")?;

    Ok(Pet {
        id: result.last_insert_rowid(),
        name: pet.name.clone(),
        animal: pet.animal.clone(),
    })
}

async fn get_pet_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Pet>> {
    let row = sqlx::query("SELECT id, name, animal FROM pets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get pet by ID")?;

    Ok(row.as_ref().map(row_to_pet_sqlite))
}

async fn list_pets_sqlite(pool: &SqlitePool) -> Result<Vec<Pet>> {
    let rows = sqlx::query("SELECT id, name, animal FROM pets ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list pets")?;

    Ok(rows.iter().map(row_to_pet_sqlite).collect())
}

async fn existing_pet_ids_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<i64>> {
    let sql = select_existing_ids_sql(ids.len());
    let mut query = sqlx::query(&sql);
    for &id in ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to look up pet ids")?;
    Ok(rows.iter().map(|row| row.get("id")).collect())
}

pub(crate) fn row_to_pet_sqlite(row: &sqlx::sqlite::SqliteRow) -> Pet {
    Pet {
        id: row.get("id"),
        name: row.get("name"),
        animal: row.get("animal"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_pet_mysql(pool: &MySqlPool, pet: &NewPet) -> Result<Pet> {
    let result = sqlx::query("INSERT INTO pets (name, animal) VALUES (?, ?)")
        .bind(&pet.name)
        .bind(&pet.animal)
        .execute(pool)
        .await
        .context("Failed to create pet")?;

    Ok(Pet {
        id: result.last_insert_id() as i64,
        name: pet.name.clone(),
        animal: pet.animal.clone(),
    })
}

async fn get_pet_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Pet>> {
    let row = sqlx::query("SELECT id, name, animal FROM pets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get pet by ID")?;

    Ok(row.as_ref().map(row_to_pet_mysql))
}

async fn list_pets_mysql(pool: &MySqlPool) -> Result<Vec<Pet>> {
    let rows = sqlx::query("SELECT id, name, animal FROM pets ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list pets")?;

    Ok(rows.iter().map(row_to_pet_mysql).collect())
}

async fn existing_pet_ids_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<Vec<i64>> {
    let sql = select_existing_ids_sql(ids.len());
    let mut query = sqlx::query(&sql);
    for &id in ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to look up pet ids")?;
    Ok(rows.iter().map(|row| row.get("id")).collect())
}

pub(crate) fn row_to_pet_mysql(row: &sqlx::mysql::MySqlRow) -> Pet {
    Pet {
        id: row.get("id"),
        name: row.get("name"),
        animal: row.get("animal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxPetRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPetRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_pet() {
        let repo = setup_test_repo().await;

        let pet = repo.create(&NewPet::new("Rex", "dog")).await.expect("Failed to create pet");

        assert!(pet.id > 0);
        assert_eq!(pet.name, "Rex");
        assert_eq!(pet.animal, "dog");
    }

    #[tokio::test]
    async fn test_get_pet_by_id() {
        let repo = setup_test_repo().await;
        let created = repo.create(&NewPet::new("Tom", "cat")).await.unwrap();

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get pet")
            .expect("Pet not found");

        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_pet_by_id_not_found() {
        let repo = setup_test_repo().await;

        let found = repo.get_by_id(99999).await.expect("Failed to get pet");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_pets_in_insertion_order() {
        let repo = setup_test_repo().await;
        for (name, animal) in [("Zed", "snake"), ("Abe", "parrot"), ("Mo", "hamster")] {
            repo.create(&NewPet::new(name, animal)).await.unwrap();
        }

        let pets = repo.list().await.expect("Failed to list pets");

        let names: Vec<_> = pets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Abe", "Mo"]);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let repo = setup_test_repo().await;
        let rex = repo.create(&NewPet::new("Rex", "dog")).await.unwrap();

        let missing = repo.missing_ids(&[rex.id, 500, 501, 500]).await.unwrap();

        assert_eq!(missing, vec![500, 501]);
    }

    #[tokio::test]
    async fn test_missing_ids_empty_and_large_batches() {
        let repo = setup_test_repo().await;
        let rex = repo.create(&NewPet::new("Rex", "dog")).await.unwrap();

        assert!(repo.missing_ids(&[]).await.unwrap().is_empty());

        let mut ids: Vec<i64> = (10_000..10_000 + 1_200).collect();
        ids.push(rex.id);
        let missing = repo.missing_ids(&ids).await.unwrap();

        assert_eq!(missing.len(), 1_200);
        assert_eq!(missing.first(), Some(&10_000));
        assert!(!missing.contains(&rex.id));
    }
}
