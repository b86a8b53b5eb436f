//! Household repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Household, NewHousehold};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait HouseholdRepository: Send + Sync {
    async fn create(&self, household: &NewHousehold) -> Result<Household>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Household>>;

    /// All households in insertion order
    async fn list(&self) -> Result<Vec<Household>>;
}

pub struct SqlxHouseholdRepository {
    pool: DynDatabasePool,
}

impl SqlxHouseholdRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HouseholdRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HouseholdRepository for SqlxHouseholdRepository {
    async fn create(&self, household: &NewHousehold) -> Result<Household> {
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => insert_household_sqlite(pool, household).await?,
            Backend::Mysql(pool) => insert_household_mysql(pool, household).await?,
        };

        Ok(Household {
            id,
            address: household.address.clone(),
            residence_type: household.residence_type.clone(),
            fenced_yard: household.fenced_yard,
            grass_access: household.grass_access,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Household>> {
        let sql = "SELECT id, address, residence_type, fenced_yard, grass_access FROM households WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get household by ID")?;
                Ok(row.as_ref().map(row_to_household_sqlite))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get household by ID")?;
                Ok(row.as_ref().map(row_to_household_mysql))
            }
        }
    }

    async fn list(&self) -> Result<Vec<Household>> {
        let sql = "SELECT id, address, residence_type, fenced_yard, grass_access FROM households ORDER BY id";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list households")?;
                Ok(rows.iter().map(row_to_household_sqlite).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list households")?;
                Ok(rows.iter().map(row_to_household_mysql).collect())
            }
        }
    }
}

const INSERT_HOUSEHOLD: &str = r#"
    INSERT INTO households (address, residence_type, fenced_yard, grass_access)
    VALUES (?, ?, ?, ?)
"#;

async fn insert_household_sqlite(pool: &SqlitePool, household: &NewHousehold) -> Result<i64> {
    let result = sqlx::query(INSERT_HOUSEHOLD)
        .bind(&household.address)
        .bind(&household.residence_type)
        .bind(household.fenced_yard)
        .bind(household.grass_access)
        .execute(pool)
        .await
        .context("Failed to create household")?;

    Ok(result.last_insert_rowid())
}

async fn insert_household_mysql(pool: &MySqlPool, household: &NewHousehold) -> Result<i64> {
    let result = sqlx::query(INSERT_HOUSEHOLD)
        .bind(&household.address)
        .bind(&household.residence_type)
        .bind(household.fenced_yard)
        .bind(household.grass_access)
        .execute(pool)
        .await
        .context("Failed to create household")?;

    Ok(result.last_insert_id() as i64)
}

fn row_to_household_sqlite(row: &sqlx::sqlite::SqliteRow) -> Household {
    Household {
        id: row.get("id"),
        address: row.get("address"),
        residence_type: row.get("residence_type"),
        fenced_yard: row.get("fenced_yard"),
        grass_access: row.get("grass_access"),
    }
}

fn row_to_household_mysql(row: &sqlx::mysql::MySqlRow) -> Household {
    Household {
        id: row.get("id"),
        address: row.get("address"),
        residence_type: row.get("residence_type"),
        fenced_yard: row.get("fenced_yard"),
        grass_access: row.get("grass_access"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxHouseholdRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxHouseholdRepository::new(pool)
    }

    fn elm_street() -> NewHousehold {
        NewHousehold {
            address: "1 Elm St".to_string(),
            residence_type: "house".to_string(),
            fenced_yard: true,
            grass_access: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_household() {
        let repo = setup_test_repo().await;

        let created = repo.create(&elm_street()).await.expect("Failed to create household");
        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get household")
            .expect("Household not found");

        assert!(created.id > 0);
        assert_eq!(found, created);
        assert!(found.fenced_yard);
        assert!(found.grass_access);
    }

    #[tokio::test]
    async fn test_booleans_roundtrip_false() {
        let repo = setup_test_repo().await;
        let flat = NewHousehold {
            address: "9 Birch Ave, Apt 4".to_string(),
            residence_type: "apartment".to_string(),
            fenced_yard: false,
            grass_access: true,
        };

        let created = repo.create(&flat).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert!(!found.fenced_yard);
        assert!(found.grass_access);
    }

    #[tokio::test]
    async fn test_list_households() {
        let repo = setup_test_repo().await;
        assert!(repo.list().await.unwrap().is_empty());

        let first = repo.create(&elm_street()).await.unwrap();
        let second = repo.create(&elm_street()).await.unwrap();

        let ids: Vec<_> = repo.list().await.unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_get_household_not_found() {
        let repo = setup_test_repo().await;

        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }
}
