//! Practice-question catalog repository.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use nerofea_core::{Difficulty, Error, Question, QuestionRepository, Result};

/// PostgreSQL implementation of QuestionRepository.
pub struct PgQuestionRepository {
    pool: Pool<Postgres>,
}

impl PgQuestionRepository {
    /// Create a new PgQuestionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_question(row: PgRow) -> Result<Question> {
    let difficulty: String = row.get("difficulty");
    Ok(Question {
        id: row.get("id"),
        number: row.get("number"),
        title: row.get("title"),
        difficulty: difficulty.parse::<Difficulty>()?,
        topic: row.get("topic"),
        estimated_minutes: row.get("estimated_minutes"),
        url: row.get("url"),
        week: row.get("week"),
    })
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn list(&self) -> Result<Vec<Question>> {
        let rows = sqlx::query(
            "SELECT id, number, title, difficulty, topic, estimated_minutes, url, week
             FROM question
             ORDER BY week ASC NULLS LAST, number ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(map_row_to_question).collect()
    }
}
