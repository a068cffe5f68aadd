//! Saved study-plan summary repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use nerofea_core::{
    new_v7, Error, Result, SaveStudyPlanRequest, StudyPlanRecord, StudyPlanRepository,
};

/// PostgreSQL implementation of StudyPlanRepository.
pub struct PgStudyPlanRepository {
    pool: Pool<Postgres>,
}

impl PgStudyPlanRepository {
    /// Create a new PgStudyPlanRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_record(row: PgRow) -> StudyPlanRecord {
    StudyPlanRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        weeks: row.get("weeks"),
        hours_per_week: row.get("hours_per_week"),
        difficulties: row.get("difficulties"),
        total_questions: row.get("total_questions"),
        total_minutes: row.get("total_minutes"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl StudyPlanRepository for PgStudyPlanRepository {
    async fn insert(&self, req: SaveStudyPlanRequest) -> Result<StudyPlanRecord> {
        let row = sqlx::query(
            "INSERT INTO study_plan
                 (id, user_id, weeks, hours_per_week, difficulties, total_questions, total_minutes, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id, user_id, weeks, hours_per_week, difficulties, total_questions, total_minutes, created_at_utc",
        )
        .bind(new_v7())
        .bind(&req.user_id)
        .bind(req.weeks)
        .bind(req.hours_per_week)
        .bind(&req.difficulties)
        .bind(req.total_questions)
        .bind(req.total_minutes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_row_to_record(row))
    }

    async fn list(&self, user_id: &str) -> Result<Vec<StudyPlanRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, weeks, hours_per_week, difficulties, total_questions, total_minutes, created_at_utc
             FROM study_plan WHERE user_id = $1
             ORDER BY created_at_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_row_to_record).collect())
    }
}
