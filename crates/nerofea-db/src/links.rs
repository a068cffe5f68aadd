//! Wiki-link repository implementation.
//!
//! The edge set is derived data: every save of a note recomputes that note's
//! outgoing links from its current content (delete-all, re-insert). There is
//! no incremental diffing; links to titles that don't exist are silently
//! dropped, and self-links and cycles are permitted.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use nerofea_core::{
    new_v7, Error, GraphData, GraphEdge, GraphNode, LinkRepository, Note, NoteLink, Result,
};

use crate::wiki_links::extract_wiki_link_titles;

/// PostgreSQL implementation of LinkRepository.
pub struct PgLinkRepository {
    pool: Pool<Postgres>,
}

impl PgLinkRepository {
    /// Create a new PgLinkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_link(row: PgRow) -> NoteLink {
    NoteLink {
        id: row.get("id"),
        source_note_id: row.get("source_note_id"),
        target_note_id: row.get("target_note_id"),
        user_id: row.get("user_id"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn resync(&self, note: &Note) -> Result<usize> {
        let titles = extract_wiki_link_titles(&note.content);

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM note_link WHERE source_note_id = $1")
            .bind(note.id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if titles.is_empty() {
            tx.commit().await.map_err(Error::Database)?;
            tracing::debug!(note_id = %note.id, "No link tokens found, cleared existing links");
            return Ok(0);
        }

        // Resolve titles to note ids owned by the same user. Unknown titles
        // drop out here; duplicate titles resolve to every matching row.
        let target_rows = sqlx::query(
            "SELECT id FROM note WHERE user_id = $1 AND title = ANY($2)",
        )
        .bind(&note.user_id)
        .bind(&titles)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let now = Utc::now();
        let mut created = 0usize;
        for row in &target_rows {
            let target_id: Uuid = row.get("id");
            let result = sqlx::query(
                "INSERT INTO note_link (id, source_note_id, target_note_id, user_id, created_at_utc)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (source_note_id, target_note_id) DO NOTHING",
            )
            .bind(new_v7())
            .bind(note.id)
            .bind(target_id)
            .bind(&note.user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
            created += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(Error::Database)?;

        tracing::debug!(
            note_id = %note.id,
            tokens = titles.len(),
            resolved = created,
            "Link re-sync complete"
        );
        Ok(created)
    }

    async fn get_outgoing(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        let rows = sqlx::query(
            "SELECT id, source_note_id, target_note_id, user_id, created_at_utc
             FROM note_link WHERE source_note_id = $1
             ORDER BY created_at_utc DESC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_link).collect())
    }

    async fn get_incoming(&self, note_id: Uuid) -> Result<Vec<NoteLink>> {
        let rows = sqlx::query(
            "SELECT id, source_note_id, target_note_id, user_id, created_at_utc
             FROM note_link WHERE target_note_id = $1
             ORDER BY created_at_utc DESC",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_link).collect())
    }

    async fn list_all(&self) -> Result<Vec<NoteLink>> {
        let rows = sqlx::query(
            "SELECT id, source_note_id, target_note_id, user_id, created_at_utc
             FROM note_link ORDER BY created_at_utc DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_link).collect())
    }

    async fn graph(&self, user_id: Option<&str>) -> Result<GraphData> {
        let (note_rows, link_rows) = match user_id {
            Some(user) => {
                let notes = sqlx::query("SELECT id, title FROM note WHERE user_id = $1")
                    .bind(user)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                let links = sqlx::query(
                    "SELECT source_note_id, target_note_id FROM note_link WHERE user_id = $1",
                )
                .bind(user)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
                (notes, links)
            }
            None => {
                let notes = sqlx::query("SELECT id, title FROM note")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                let links = sqlx::query("SELECT source_note_id, target_note_id FROM note_link")
                    .fetch_all(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                (notes, links)
            }
        };

        let nodes = note_rows
            .into_iter()
            .map(|row| GraphNode {
                id: row.get("id"),
                name: row.get("title"),
            })
            .collect();

        let links = link_rows
            .into_iter()
            .map(|row| GraphEdge {
                source: row.get("source_note_id"),
                target: row.get("target_note_id"),
            })
            .collect();

        Ok(GraphData { nodes, links })
    }
}
