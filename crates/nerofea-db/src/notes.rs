//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use nerofea_core::{
    new_v7, CreateNoteRequest, Error, ListNotesRequest, Note, NoteRepository, Result,
    UpdateNoteRequest,
};

use crate::escape_like;

const NOTE_COLUMNS: &str =
    "id, topic_id, title, content, user_id, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_note(row: PgRow) -> Note {
    Note {
        id: row.get("id"),
        topic_id: row.get("topic_id"),
        title: row.get("title"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let id = new_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            "INSERT INTO note (id, topic_id, title, content, user_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.topic_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(&req.user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_row_to_note(row))
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLUMNS} FROM note WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        Ok(map_row_to_note(row))
    }

    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>> {
        let mut query = format!("SELECT {NOTE_COLUMNS} FROM note WHERE 1=1 ");
        let mut param_idx = 1;

        if req.topic_id.is_some() {
            query.push_str(&format!("AND topic_id = ${} ", param_idx));
            param_idx += 1;
        }
        if req.user_id.is_some() {
            query.push_str(&format!("AND user_id = ${} ", param_idx));
        }
        query.push_str("ORDER BY updated_at_utc DESC");

        let mut q = sqlx::query(&query);
        if let Some(topic_id) = req.topic_id {
            q = q.bind(topic_id);
        }
        if let Some(user_id) = &req.user_id {
            q = q.bind(user_id);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(rows.into_iter().map(map_row_to_note).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        // $1 = now, $2 = id, then dynamic params start at $3
        let mut updates: Vec<String> = vec!["updated_at_utc = $1".to_string()];
        let mut param_idx = 3;

        if req.topic_id.is_some() {
            updates.push(format!("topic_id = ${}", param_idx));
            param_idx += 1;
        }
        if req.title.is_some() {
            updates.push(format!("title = ${}", param_idx));
            param_idx += 1;
        }
        if req.content.is_some() {
            updates.push(format!("content = ${}", param_idx));
        }

        let query = format!(
            "UPDATE note SET {} WHERE id = $2 RETURNING {NOTE_COLUMNS}",
            updates.join(", ")
        );

        let mut q = sqlx::query(&query).bind(Utc::now()).bind(id);
        if let Some(topic_id) = req.topic_id {
            q = q.bind(topic_id);
        }
        if let Some(title) = &req.title {
            q = q.bind(title);
        }
        if let Some(content) = &req.content {
            q = q.bind(content);
        }

        let row = q
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::NoteNotFound(id))?;

        Ok(map_row_to_note(row))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn search(&self, query: &str, user_id: Option<&str>) -> Result<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = match user_id {
            Some(user) => {
                sqlx::query(&format!(
                    "SELECT {NOTE_COLUMNS} FROM note
                     WHERE (title ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\')
                       AND user_id = $2
                     ORDER BY updated_at_utc DESC"
                ))
                .bind(&pattern)
                .bind(user)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {NOTE_COLUMNS} FROM note
                     WHERE title ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\'
                     ORDER BY updated_at_utc DESC"
                ))
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_note).collect())
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM note WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.is_some())
    }
}
