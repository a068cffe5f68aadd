//! Repository and backend trait definitions.
//!
//! Repositories abstract the PostgreSQL layer; backend traits abstract the
//! third-party assistant APIs so handlers can be tested against mocks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Attachment, CreateNoteRequest, CreateTopicRequest, GraphData, ListNotesRequest, Note, NoteLink,
    Question, SaveStudyPlanRequest, StudyPlanRecord, Topic, UpdateNoteRequest,
};
use crate::Result;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Repository for topic CRUD operations.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Insert a new topic and return its id.
    async fn insert(&self, req: CreateTopicRequest) -> Result<Topic>;

    /// Fetch a topic by id.
    async fn fetch(&self, id: Uuid) -> Result<Topic>;

    /// List topics, ordered by title, optionally scoped to a user.
    async fn list(&self, user_id: Option<&str>) -> Result<Vec<Topic>>;

    /// Rename a topic.
    async fn rename(&self, id: Uuid, title: &str) -> Result<()>;

    /// Delete a topic. Notes under it cascade away.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Check whether a topic exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

/// Repository for note CRUD and search.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note and return it.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by id.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// List notes ordered by `updated_at_utc` descending.
    async fn list(&self, req: ListNotesRequest) -> Result<Vec<Note>>;

    /// Apply a partial update and return the updated note.
    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note. Links and attachments cascade away.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Case-insensitive substring search over title and content.
    async fn search(&self, query: &str, user_id: Option<&str>) -> Result<Vec<Note>>;

    /// Check whether a note exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

/// Repository for derived wiki-link edges.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Recompute the outgoing edge set of a note from its current content.
    ///
    /// Deletes all previously recorded outgoing links and inserts the freshly
    /// resolved set in one transaction. Returns the number of edges created.
    async fn resync(&self, note: &Note) -> Result<usize>;

    /// Outgoing edges of a note.
    async fn get_outgoing(&self, note_id: Uuid) -> Result<Vec<NoteLink>>;

    /// Incoming edges (backlinks) of a note.
    async fn get_incoming(&self, note_id: Uuid) -> Result<Vec<NoteLink>>;

    /// All edges in the database.
    async fn list_all(&self) -> Result<Vec<NoteLink>>;

    /// Assemble the knowledge graph, optionally scoped to a user.
    async fn graph(&self, user_id: Option<&str>) -> Result<GraphData>;
}

/// Repository for the practice-question catalog.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Full catalog ordered by week, then number.
    async fn list(&self) -> Result<Vec<Question>>;
}

/// Repository for saved study-plan summaries.
#[async_trait]
pub trait StudyPlanRepository: Send + Sync {
    /// Persist a plan summary row.
    async fn insert(&self, req: SaveStudyPlanRequest) -> Result<StudyPlanRecord>;

    /// List saved summaries for a user, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<StudyPlanRecord>>;
}

/// Store for attachment blobs and metadata.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Validate and persist an upload, returning the metadata row.
    ///
    /// Validation (size cap, MIME allow-list, executable rejection) happens
    /// before any storage write.
    async fn upload(
        &self,
        note_id: Uuid,
        user_id: &str,
        file_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment>;

    /// List attachments of a note.
    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Attachment>>;

    /// Fetch blob bytes plus MIME type and original filename.
    async fn download(&self, id: Uuid) -> Result<(Vec<u8>, String, String)>;

    /// Remove blob and metadata row.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// ASSISTANT BACKEND TRAITS
// =============================================================================

/// Chat-completion backend (the "explain" assistant mode).
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a single user message and return the assistant reply.
    async fn chat(&self, message: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Free-form text-generation backend (the "generate" assistant mode).
#[async_trait]
pub trait TextGenerationBackend: Send + Sync {
    /// Generate a continuation for the prompt.
    ///
    /// Implementations degrade to canned fallback text rather than erroring
    /// when the upstream model is unavailable.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Web-search backend (the "research" assistant mode).
#[async_trait]
pub trait WebSearchBackend: Send + Sync {
    /// Run a search and return a formatted markdown digest.
    async fn search(&self, query: &str) -> Result<String>;
}
