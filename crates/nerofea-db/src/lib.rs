//! # nerofea-db
//!
//! PostgreSQL database layer for nerofea.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for topics, notes, links, attachments,
//!   the practice-question catalog, and saved study plans
//! - `[[Title]]` wiki-link extraction and re-sync
//! - Filesystem blob storage for attachments
//!
//! ## Example
//!
//! ```rust,ignore
//! use nerofea_db::Database;
//! use nerofea_core::{CreateNoteRequest, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/nerofea").await?;
//!
//!     let note = db.notes.insert(CreateNoteRequest {
//!         topic_id,
//!         title: "Two Sum".to_string(),
//!         content: "<p>See [[Binary Search]]</p>".to_string(),
//!         user_id: "student-1".to_string(),
//!     }).await?;
//!
//!     let edges = db.links.resync(&note).await?;
//!     println!("Created note {} with {} links", note.id, edges);
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod links;
pub mod notes;
pub mod pool;
pub mod questions;
pub mod study_plans;
pub mod topics;
pub mod wiki_links;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use nerofea_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use attachments::{
    generate_storage_path, FilesystemBackend, PgAttachmentRepository, StorageBackend,
};
pub use links::PgLinkRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use questions::PgQuestionRepository;
pub use study_plans::PgStudyPlanRepository;
pub use topics::PgTopicRepository;
pub use wiki_links::extract_wiki_link_titles;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Topic repository for CRUD operations.
    pub topics: PgTopicRepository,
    /// Note repository for CRUD and search.
    pub notes: PgNoteRepository,
    /// Wiki-link repository for edge re-sync and graph assembly.
    pub links: PgLinkRepository,
    /// Practice-question catalog repository.
    pub questions: PgQuestionRepository,
    /// Saved study-plan summary repository.
    pub study_plans: PgStudyPlanRepository,
    /// Attachment store (requires backend configuration).
    /// Use `with_filesystem_storage` to configure.
    pub attachments: Option<PgAttachmentRepository>,
    /// Attachment storage base path (used by Clone to reconstruct the backend).
    storage_path: Option<String>,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            topics: PgTopicRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            links: PgLinkRepository::new(pool.clone()),
            questions: PgQuestionRepository::new(pool.clone()),
            study_plans: PgStudyPlanRepository::new(pool.clone()),
            attachments: None,
            storage_path: None,
            pool,
        }
    }

    /// Configure attachment storage with a filesystem backend path.
    pub fn with_filesystem_storage(mut self, path: &str) -> Self {
        self.attachments = Some(PgAttachmentRepository::new(
            self.pool.clone(),
            FilesystemBackend::new(path),
        ));
        self.storage_path = Some(path.to_string());
        self
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            topics: PgTopicRepository::new(self.pool.clone()),
            notes: PgNoteRepository::new(self.pool.clone()),
            links: PgLinkRepository::new(self.pool.clone()),
            questions: PgQuestionRepository::new(self.pool.clone()),
            study_plans: PgStudyPlanRepository::new(self.pool.clone()),
            attachments: self.storage_path.as_ref().map(|path| {
                PgAttachmentRepository::new(self.pool.clone(), FilesystemBackend::new(path))
            }),
            storage_path: self.storage_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
