use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::connector::SqliteConnector;
use super::manager::{ConnectionManager, HealthReport};
use super::models::{GeneratedPage, NewPage};
use crate::config::StoreBudgets;
use crate::error::ForgeError;

const PAGE_COLUMNS: &str = "id, prompt, html_version, nextjs_version, created_at";

/// Persistence for generated pages. Every call goes through the connection
/// manager and is bounded by the matching budget.
#[derive(Clone)]
pub struct PageStore {
    manager: ConnectionManager<SqliteConnector>,
    budgets: StoreBudgets,
}

impl PageStore {
    pub fn new(manager: ConnectionManager<SqliteConnector>, budgets: StoreBudgets) -> Self {
        Self { manager, budgets }
    }

    pub fn manager(&self) -> &ConnectionManager<SqliteConnector> {
        &self.manager
    }

    pub async fn health_check(&self) -> HealthReport {
        self.manager.health_check().await
    }

    /// Persists a page, assigning a fresh id and creation time.
    pub async fn insert(&self, page: NewPage) -> Result<GeneratedPage, ForgeError> {
        let record = GeneratedPage {
            id: Uuid::new_v4().to_string(),
            prompt: page.prompt().to_string(),
            html_version: page.html_version().to_string(),
            nextjs_version: page.nextjs_version().to_string(),
            created_at: Utc::now(),
        };

        self.manager
            .with_connection("insert page", self.budgets.write, move |pool| async move {
                sqlx::query(
                    r#"
                    INSERT INTO pages (id, prompt, html_version, nextjs_version, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&record.id)
                .bind(&record.prompt)
                .bind(&record.html_version)
                .bind(&record.nextjs_version)
                .bind(record.created_at)
                .execute(&pool)
                .await
                .map_err(ForgeError::StoreWriteFailed)?;
                Ok(record)
            })
            .await
    }

    /// Newest first. `limit` is clamped to the configured maximum.
    pub async fn list_all(&self, limit: Option<u32>) -> Result<Vec<GeneratedPage>, ForgeError> {
        let max = self.budgets.list_limit;
        let limit = limit.map_or(max, |l| l.clamp(1, max));

        self.manager
            .with_connection("list pages", self.budgets.read, move |pool| async move {
                fetch_newest(&pool, limit)
                    .await
                    .map_err(ForgeError::StoreReadFailed)
            })
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<GeneratedPage>, ForgeError> {
        let id = id.to_string();
        self.manager
            .with_connection("find page", self.budgets.lookup, move |pool| async move {
                sqlx::query_as::<_, GeneratedPage>(&format!(
                    "SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?"
                ))
                .bind(id)
                .fetch_optional(&pool)
                .await
                .map_err(ForgeError::StoreReadFailed)
            })
            .await
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete_by_id(&self, id: &str) -> Result<u64, ForgeError> {
        let id = id.to_string();
        self.manager
            .with_connection("delete page", self.budgets.write, move |pool| async move {
                let res = sqlx::query("DELETE FROM pages WHERE id = ?")
                    .bind(id)
                    .execute(&pool)
                    .await
                    .map_err(ForgeError::StoreWriteFailed)?;
                Ok(res.rows_affected())
            })
            .await
    }
}

async fn fetch_newest(pool: &SqlitePool, limit: u32) -> Result<Vec<GeneratedPage>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedPage>(&format!(
        "SELECT {PAGE_COLUMNS} FROM pages ORDER BY created_at DESC, rowid DESC LIMIT ?"
    ))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await
}
