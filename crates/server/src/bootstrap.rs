use procura_core::config::{AppConfig, ConfigError, LoadOptions};
use procura_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    Ok(Application { config, db_pool })
}

#[cfg(test)]
mod tests {
    use procura_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_connects_and_applies_migrations() {
        let app = bootstrap(memory_options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed against an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('tender', 'proposal', 'approval', 'audit_event')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema should be queryable after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose all workflow tables");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_urls() {
        let result = bootstrap(memory_options("postgres://localhost/procura")).await;
        assert!(result.is_err());
    }
}
