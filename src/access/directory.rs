use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::user::UserId;

/// Read-only view of the `manager_id` reporting lines.
///
/// Only active users are visible through either method.
#[async_trait]
pub trait ReportingDirectory {
    async fn is_direct_report(
        &self,
        manager_id: UserId,
        employee_id: UserId,
    ) -> Result<bool, sqlx::Error>;

    async fn direct_reports(&self, manager_id: UserId) -> Result<Vec<UserId>, sqlx::Error>;
}

pub struct MySqlDirectory<'a> {
    pool: &'a MySqlPool,
}

impl<'a> MySqlDirectory<'a> {
    pub fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportingDirectory for MySqlDirectory<'_> {
    async fn is_direct_report(
        &self,
        manager_id: UserId,
        employee_id: UserId,
    ) -> Result<bool, sqlx::Error> {
        let found = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE id = ? AND manager_id = ? AND is_active = TRUE
                LIMIT 1
            )
            "#,
        )
        .bind(employee_id)
        .bind(manager_id)
        .fetch_one(self.pool)
        .await?;

        Ok(found != 0)
    }

    async fn direct_reports(&self, manager_id: UserId) -> Result<Vec<UserId>, sqlx::Error> {
        sqlx::query_scalar::<_, u64>(
            r#"
            SELECT id FROM users
            WHERE manager_id = ? AND is_active = TRUE
            ORDER BY id
            "#,
        )
        .bind(manager_id)
        .fetch_all(self.pool)
        .await
    }
}
