//! PostgreSQL waitlist backend.
//!
//! Uniqueness is enforced by the table's `UNIQUE (email)` constraint, so a
//! duplicate shows up as SQLSTATE `23505` on insert rather than via a
//! separate existence query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};

use super::{StoreError, WaitlistStore};
use crate::models::WaitlistEntry;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS waitlist (
        id BIGSERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and make sure the `waitlist` table exists.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::info!("waitlist table ready");
        Ok(())
    }
}

#[async_trait]
impl WaitlistStore for PostgresStore {
    async fn insert(&self, email: &str) -> Result<WaitlistEntry, StoreError> {
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO waitlist (email) VALUES ($1) RETURNING created_at",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(WaitlistEntry {
            email: email.to_string(),
            created_at,
        })
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM waitlist")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::Duplicate
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}
