//! Versioned schema migrations for the access-control database

use crate::error::{StoreError, StoreResult};
use sqlx::SqlitePool;

/// Database migration manager
pub struct MigrationRunner {
    pool: SqlitePool,
}

impl MigrationRunner {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let applied_versions: Vec<i64> =
            sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
                .fetch_all(&self.pool)
                .await?;

        if !applied_versions.contains(&1) {
            tracing::info!("applying migration 001_access_tables");
            self.run_migration_001().await?;
            sqlx::query("INSERT INTO _migrations (version, name) VALUES (1, '001_access_tables')")
                .execute(&self.pool)
                .await?;
        }

        if !applied_versions.contains(&2) {
            tracing::info!("applying migration 002_tenant_credentials");
            self.run_migration_002().await?;
            sqlx::query(
                "INSERT INTO _migrations (version, name) VALUES (2, '002_tenant_credentials')",
            )
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Group membership, group-to-server grants, and the admin flag.
    async fn run_migration_001(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_group_membership (
                user_email TEXT NOT NULL,
                group_name TEXT NOT NULL,
                PRIMARY KEY (user_email, group_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("001 user_group_membership: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS group_tenant_mapping (
                group_name TEXT NOT NULL,
                server_id TEXT NOT NULL,
                PRIMARY KEY (group_name, server_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("001 group_tenant_mapping: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admin_status (
                user_email TEXT PRIMARY KEY,
                is_admin INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("001 admin_status: {e}")))?;

        Ok(())
    }

    /// Optional per-tenant credential/endpoint overrides.
    async fn run_migration_002(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenant_credentials (
                tenant_id TEXT NOT NULL,
                server_id TEXT NOT NULL,
                api_key TEXT,
                endpoint_url TEXT,
                PRIMARY KEY (tenant_id, server_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("002 tenant_credentials: {e}")))?;

        Ok(())
    }
}
