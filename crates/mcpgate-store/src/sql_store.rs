//! SQLite-backed access store

use crate::access_store::{AccessStore, CredentialOverride};
use crate::error::{StoreError, StoreResult};
use crate::migrations::MigrationRunner;
use async_trait::async_trait;
use mcpgate_core::{GroupName, ServerId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;

/// SQLite-based store implementation
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Create a new SqlStore with database URL and optional pool configuration
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        Self::new_with_config(database_url, None).await
    }

    /// Create SqlStore with custom pool configuration
    pub async fn new_with_config(
        database_url: &str,
        max_connections: Option<u32>,
    ) -> StoreResult<Self> {
        let max_conn = max_connections.unwrap_or_else(|| {
            std::env::var("MCPGATE_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10)
        });

        // Robust handling for sqlite file URLs; enable create_if_missing
        let pool = if let Some(path_str) = database_url.strip_prefix("sqlite://") {
            let path = PathBuf::from(path_str);
            let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
            SqlitePoolOptions::new().max_connections(max_conn).connect_with(options).await?
        } else {
            let options =
                SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
            SqlitePoolOptions::new().max_connections(max_conn).connect_with(options).await?
        };

        sqlx::query("PRAGMA foreign_keys = ON;").execute(&pool).await?;
        sqlx::query("PRAGMA journal_mode = WAL;").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous = NORMAL;").execute(&pool).await?;

        let store = Self { pool };

        let migration_runner = MigrationRunner::new(store.pool.clone());
        migration_runner.migrate().await?;

        Ok(store)
    }

    /// Create SqlStore from existing pool (for testing)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Run migrations manually
    pub async fn migrate(&self) -> StoreResult<()> {
        MigrationRunner::new(self.pool.clone()).migrate().await
    }

    /// Grant group membership to a user (admin tooling / seeding).
    pub async fn add_group_membership(&self, email: &str, group: &GroupName) -> StoreResult<()> {
        if email.trim().is_empty() {
            return Err(StoreError::Invalid("user email must not be empty".into()));
        }
        sqlx::query(
            r#"
            INSERT INTO user_group_membership (user_email, group_name)
            VALUES (?1, ?2)
            ON CONFLICT (user_email, group_name) DO NOTHING
            "#,
        )
        .bind(email)
        .bind(group.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Grant a group access to a server.
    pub async fn add_group_server_mapping(
        &self,
        group: &GroupName,
        server: &ServerId,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO group_tenant_mapping (group_name, server_id)
            VALUES (?1, ?2)
            ON CONFLICT (group_name, server_id) DO NOTHING
            "#,
        )
        .bind(group.as_str())
        .bind(server.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Set or clear the persisted admin flag for a user.
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> StoreResult<()> {
        if email.trim().is_empty() {
            return Err(StoreError::Invalid("user email must not be empty".into()));
        }
        sqlx::query(
            r#"
            INSERT INTO admin_status (user_email, is_admin)
            VALUES (?1, ?2)
            ON CONFLICT (user_email) DO UPDATE SET is_admin = ?2
            "#,
        )
        .bind(email)
        .bind(i64::from(is_admin))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Store a tenant-specific credential/endpoint override for a server.
    pub async fn set_credential_override(
        &self,
        tenant: &GroupName,
        server: &ServerId,
        override_: &CredentialOverride,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenant_credentials (tenant_id, server_id, api_key, endpoint_url)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (tenant_id, server_id) DO UPDATE SET api_key = ?3, endpoint_url = ?4
            "#,
        )
        .bind(tenant.as_str())
        .bind(server.as_str())
        .bind(override_.api_key.as_deref())
        .bind(override_.endpoint_url.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AccessStore for SqlStore {
    async fn groups_for_user(&self, email: &str) -> StoreResult<Vec<GroupName>> {
        if email.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query(
            r#"
            SELECT group_name FROM user_group_membership
            WHERE LOWER(user_email) = LOWER(?1)
            ORDER BY group_name
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| GroupName::new(r.get::<String, _>("group_name"))).collect())
    }

    async fn servers_for_groups(&self, groups: &[GroupName]) -> StoreResult<Vec<ServerId>> {
        if groups.is_empty() {
            return Ok(vec![]);
        }

        // sqlx/sqlite has no array binds; build a placeholder list.
        let placeholders =
            (1..=groups.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT DISTINCT server_id FROM group_tenant_mapping \
             WHERE group_name IN ({placeholders}) ORDER BY server_id"
        );

        let mut query = sqlx::query(&sql);
        for group in groups {
            query = query.bind(group.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows.iter().map(|r| ServerId::new(r.get::<String, _>("server_id"))).collect())
    }

    async fn is_admin(&self, email: &str) -> StoreResult<bool> {
        if email.is_empty() {
            return Ok(false);
        }
        let row = sqlx::query(
            "SELECT is_admin FROM admin_status WHERE LOWER(user_email) = LOWER(?1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<i64, _>("is_admin") != 0).unwrap_or(false))
    }

    async fn credential_override(
        &self,
        tenant: &GroupName,
        server: &ServerId,
    ) -> StoreResult<Option<CredentialOverride>> {
        let row = sqlx::query(
            r#"
            SELECT api_key, endpoint_url FROM tenant_credentials
            WHERE tenant_id = ?1 AND server_id = ?2
            "#,
        )
        .bind(tenant.as_str())
        .bind(server.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CredentialOverride {
            api_key: r.get::<Option<String>, _>("api_key"),
            endpoint_url: r.get::<Option<String>, _>("endpoint_url"),
        }))
    }

    async fn healthy(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
