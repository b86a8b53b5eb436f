//! User repository
//!
//! Database operations for users and their pet associations.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! Links between users and pets live in `user_pet`. Linking is idempotent:
//! a pair is stored at most once. Batch linking runs in one transaction so a
//! failure leaves no partial links behind.

use crate::db::repositories::pet::{row_to_pet_mysql, row_to_pet_sqlite};
use crate::db::{Backend, DynDatabasePool};
use crate::models::{NewUser, Pet, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with its assigned id
    async fn create(&self, user: &NewUser) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// All users in insertion order
    async fn list(&self) -> Result<Vec<User>>;

    /// Residents of a household in insertion order
    async fn list_by_household(&self, household_id: i64) -> Result<Vec<User>>;

    /// Persist name and email of an existing user (last write wins)
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user and its pet links. Returns false if no row matched.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Link a pet to a user. Returns false if the pair was already linked.
    async fn add_pet(&self, user_id: i64, pet_id: i64) -> Result<bool>;

    /// Link several pets in one transaction. Returns the number of new links.
    async fn add_pets(&self, user_id: i64, pet_ids: &[i64]) -> Result<usize>;

    /// Pets linked to a user, ordered by pet id
    async fn list_pets(&self, user_id: i64) -> Result<Vec<Pet>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_user_sqlite(pool, user).await,
            Backend::Mysql(pool) => create_user_mysql(pool, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_user_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_user_by_id_mysql(pool, id).await,
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_users_sqlite(pool, None).await,
            Backend::Mysql(pool) => list_users_mysql(pool, None).await,
        }
    }

    async fn list_by_household(&self, household_id: i64) -> Result<Vec<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_users_sqlite(pool, Some(household_id)).await,
            Backend::Mysql(pool) => list_users_mysql(pool, Some(household_id)).await,
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_user_sqlite(pool, user).await?,
            Backend::Mysql(pool) => update_user_mysql(pool, user).await?,
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_user_sqlite(pool, id).await,
            Backend::Mysql(pool) => delete_user_mysql(pool, id).await,
        }
    }

    async fn add_pet(&self, user_id: i64, pet_id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => add_pet_sqlite(pool, user_id, pet_id).await,
            Backend::Mysql(pool) => add_pet_mysql(pool, user_id, pet_id).await,
        }
    }

    async fn add_pets(&self, user_id: i64, pet_ids: &[i64]) -> Result<usize> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => add_pets_sqlite(pool, user_id, pet_ids).await,
            Backend::Mysql(pool) => add_pets_mysql(pool, user_id, pet_ids).await,
        }
    }

    async fn list_pets(&self, user_id: i64) -> Result<Vec<Pet>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_user_pets_sqlite(pool, user_id).await,
            Backend::Mysql(pool) => list_user_pets_mysql(pool, user_id).await,
        }
    }
}

const SELECT_USERS: &str = "SELECT id, name, email, household_id FROM users";

const SELECT_USER_PETS: &str = r#"
    SELECT p.id, p.name, p.animal
    FROM pets p
    INNER JOIN user_pet up ON p.id = up.pet_id
    WHERE up.user_id = ?
    ORDER BY p.id
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    let result = sqlx::query("INSERT INTO users (name, email, household_id) VALUES (?, ?, ?)")
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.household_id)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        name: user.name.clone(),
        email: user.email.clone(),
        household_id: user.household_id,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USERS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    Ok(row.as_ref().map(row_to_user_sqlite))
}

async fn list_users_sqlite(pool: &SqlitePool, household_id: Option<i64>) -> Result<Vec<User>> {
    let rows = match household_id {
        Some(household_id) => {
            sqlx::query(&format!("{} WHERE household_id = ? ORDER BY id", SELECT_USERS))
                .bind(household_id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query(&format!("{} ORDER BY id", SELECT_USERS))
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list users")?;

    Ok(rows.iter().map(row_to_user_sqlite).collect())
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.id)
        .execute(pool)
        .await
        .context("Failed to update user")?;

    Ok(())
}

async fn delete_user_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    // user_pet rows go with the user (ON DELETE CASCADE)
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

async fn add_pet_sqlite(pool: &SqlitePool, user_id: i64, pet_id: i64) -> Result<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO user_pet (user_id, pet_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(pet_id)
        .execute(pool)
        .await
        .context("Failed to add pet to user")?;

    Ok(result.rows_affected() > 0)
}

async fn add_pets_sqlite(pool: &SqlitePool, user_id: i64, pet_ids: &[i64]) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut added = 0;

    for &pet_id in pet_ids {
        let result = sqlx::query("INSERT OR IGNORE INTO user_pet (user_id, pet_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(pet_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to add pet {} to user {}", pet_id, user_id))?;
        added += result.rows_affected() as usize;
    }

    tx.commit().await.context("Failed to commit pet links")?;
    Ok(added)
}

async fn list_user_pets_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Vec<Pet>> {
    let rows = sqlx::query(SELECT_USER_PETS)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list pets of user")?;

    Ok(rows.iter().map(row_to_pet_sqlite).collect())
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        household_id: row.get("household_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &NewUser) -> Result<User> {
    let result = sqlx::query("INSERT INTO users (name, email, household_id) VALUES (?, ?, ?)")
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.household_id)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        name: user.name.clone(),
        email: user.email.clone(),
        household_id: user.household_id,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USERS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    Ok(row.as_ref().map(row_to_user_mysql))
}

async fn list_users_mysql(pool: &MySqlPool, household_id: Option<i64>) -> Result<Vec<User>> {
    let rows = match household_id {
        Some(household_id) => {
            sqlx::query(&format!("{} WHERE household_id = ? ORDER BY id", SELECT_USERS))
                .bind(household_id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query(&format!("{} ORDER BY id", SELECT_USERS))
                .fetch_all(pool)
                .await
        }
    }
    .context("Failed to list users")?;

    Ok(rows.iter().map(row_to_user_mysql).collect())
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<()> {
    sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.id)
        .execute(pool)
        .await
        .context("Failed to update user")?;

    Ok(())
}

async fn delete_user_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

// INSERT IGNORE would also swallow foreign key failures on MySQL, so the
// existing pair is looked up first inside the same transaction.
async fn link_pet_mysql(
    conn: &mut sqlx::MySqlConnection,
    user_id: i64,
    pet_id: i64,
) -> Result<bool> {
    let existing = sqlx::query("SELECT 1 FROM user_pet WHERE user_id = ? AND pet_id = ? FOR UPDATE")
        .bind(user_id)
        .bind(pet_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to check pet link")?;
    if existing.is_some() {
        return Ok(false);
    }

    sqlx::query("INSERT INTO user_pet (user_id, pet_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(pet_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to add pet {} to user {}", pet_id, user_id))?;
    Ok(true)
}

async fn add_pet_mysql(pool: &MySqlPool, user_id: i64, pet_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let added = link_pet_mysql(&mut tx, user_id, pet_id).await?;
    tx.commit().await.context("Failed to commit pet link")?;
    Ok(added)
}

async fn add_pets_mysql(pool: &MySqlPool, user_id: i64, pet_ids: &[i64]) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut added = 0;

    for &pet_id in pet_ids {
        if link_pet_mysql(&mut tx, user_id, pet_id).await? {
            added += 1;
        }
    }

    tx.commit().await.context("Failed to commit pet links")?;
    Ok(added)
}

async fn list_user_pets_mysql(pool: &MySqlPool, user_id: i64) -> Result<Vec<Pet>> {
    let rows = sqlx::query(SELECT_USER_PETS)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list pets of user")?;

    Ok(rows.iter().map(row_to_pet_mysql).collect())
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        household_id: row.get("household_id"),
    }
}
