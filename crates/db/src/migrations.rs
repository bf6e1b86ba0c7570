use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::connect_with_settings;

    /// Every table and index the migrations are expected to manage. Schema
    /// drift (added or removed objects without updating this contract) fails
    /// the test.
    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "tender",
        "proposal",
        "approval",
        "audit_event",
        "idx_proposal_tender_id",
        "idx_approval_proposal_scope",
        "idx_approval_tender_scope",
        "idx_approval_approver_email",
        "idx_approval_decision",
        "idx_audit_event_entity",
        "idx_audit_event_occurred_at",
    ];

    #[tokio::test]
    async fn migrations_create_the_managed_schema() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrations");

        let rows = sqlx::query(
            "SELECT name FROM sqlite_master
             WHERE type IN ('table', 'index')
               AND name NOT LIKE 'sqlite_%'
               AND name NOT LIKE '_sqlx_%'",
        )
        .fetch_all(&pool)
        .await
        .expect("schema query");

        let mut names: Vec<String> =
            rows.iter().map(|row| row.get::<String, _>("name")).collect();
        names.sort();
        names.retain(|name| !name.starts_with("sqlite_autoindex"));

        let mut expected: Vec<String> =
            MANAGED_SCHEMA_OBJECTS.iter().map(ToString::to_string).collect();
        expected.sort();

        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run");
    }
}
