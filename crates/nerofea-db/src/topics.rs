//! Topic repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use nerofea_core::{new_v7, CreateTopicRequest, Error, Result, Topic, TopicRepository};

/// PostgreSQL implementation of TopicRepository.
pub struct PgTopicRepository {
    pool: Pool<Postgres>,
}

impl PgTopicRepository {
    /// Create a new PgTopicRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_topic(row: PgRow) -> Topic {
    Topic {
        id: row.get("id"),
        title: row.get("title"),
        user_id: row.get("user_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

#[async_trait]
impl TopicRepository for PgTopicRepository {
    async fn insert(&self, req: CreateTopicRequest) -> Result<Topic> {
        let id = new_v7();
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO topic (id, title, user_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING id, title, user_id, created_at_utc, updated_at_utc",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_row_to_topic(row))
    }

    async fn fetch(&self, id: Uuid) -> Result<Topic> {
        let row = sqlx::query(
            "SELECT id, title, user_id, created_at_utc, updated_at_utc
             FROM topic WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::TopicNotFound(id))?;

        Ok(map_row_to_topic(row))
    }

    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Topic>> {
        let rows = match user_id {
            Some(user) => {
                sqlx::query(
                    "SELECT id, title, user_id, created_at_utc, updated_at_utc
                     FROM topic WHERE user_id = $1 ORDER BY title ASC",
                )
                .bind(user)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT id, title, user_id, created_at_utc, updated_at_utc
                     FROM topic ORDER BY title ASC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_topic).collect())
    }

    async fn rename(&self, id: Uuid, title: &str) -> Result<()> {
        let result = sqlx::query("UPDATE topic SET title = $1, updated_at_utc = $2 WHERE id = $3")
            .bind(title)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TopicNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM topic WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TopicNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM topic WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.is_some())
    }
}
