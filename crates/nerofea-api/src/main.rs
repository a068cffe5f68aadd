//! nerofea-api - HTTP API server for nerofea

mod handlers;

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use uuid::Uuid;

use nerofea_assist::{GroqBackend, HuggingFaceBackend, TavilyBackend};
use nerofea_core::{
    defaults, ChatBackend, CreateNoteRequest, CreateTopicRequest, LinkRepository,
    ListNotesRequest, Note, NoteRepository, TextGenerationBackend, TopicRepository,
    UpdateNoteRequest, WebSearchBackend,
};
use nerofea_db::Database;

use nerofea_api::services::QuestionCache;

use handlers::{
    assistant::{assistant_explain, assistant_generate, assistant_research},
    attachments::{delete_attachment, download_attachment, list_attachments, upload_attachment},
    study_plans::{generate_study_plan, list_study_plans, save_study_plan},
};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Global rate limiter type (direct quota, no keyed bucketing).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) db: Database,
    /// Chat-completion backend for the "explain" assistant mode.
    pub(crate) chat: Arc<dyn ChatBackend>,
    /// Text-generation backend for the "generate" assistant mode.
    pub(crate) generation: Arc<dyn TextGenerationBackend>,
    /// Web-search backend for the "research" assistant mode.
    pub(crate) web_search: Arc<dyn WebSearchBackend>,
    /// Question catalog snapshot cache.
    pub(crate) question_cache: QuestionCache,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

/// OpenAPI documentation (utoipa metadata).
///
/// The comprehensive OpenAPI spec is maintained in `openapi.yaml` and served
/// at `/openapi.yaml`.
#[allow(dead_code)]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nerofea API",
        version = "0.4.0",
        description = "Study-notes server with wiki-links, a knowledge graph, attachments, AI assistant proxies, and study-plan generation"
    ),
    tags(
        (name = "Topics", description = "Topic CRUD operations"),
        (name = "Notes", description = "Note CRUD and search"),
        (name = "Links", description = "Wiki-link edges and graph data"),
        (name = "Attachments", description = "File attachments"),
        (name = "Assistant", description = "AI assistant proxies"),
        (name = "Questions", description = "Practice-question catalog"),
        (name = "StudyPlans", description = "Study plan generation and persistence"),
        (name = "System", description = "Health checks and system info")
    )
)]
struct ApiDoc;

/// Serve OpenAPI YAML spec
async fn openapi_yaml() -> impl IntoResponse {
    const SPEC: &str = include_str!("openapi.yaml");
    ([(header::CONTENT_TYPE, "application/yaml")], SPEC)
}

// =============================================================================
// CORS CONFIGURATION HELPER
// =============================================================================

/// Parse allowed origins from comma-separated environment variable.
///
/// # Environment Variable
/// `ALLOWED_ORIGINS` - Comma-separated list of allowed origins
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str =
        std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static("http://localhost:3000")];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// LINK RE-SYNC HELPER
// =============================================================================

/// Queue a wiki-link re-sync for a note.
///
/// Fire-and-forget: a failed re-sync is logged and never surfaced to the
/// request that triggered it. Called after creating a note and after any
/// update that changed content.
fn spawn_link_resync(db: Database, note: Note) {
    tokio::spawn(async move {
        match db.links.resync(&note).await {
            Ok(count) => {
                tracing::debug!(note_id = %note.id, links = count, "Link re-sync complete")
            }
            Err(e) => error!(note_id = %note.id, error = %e, "Link re-sync failed"),
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "nerofea_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "nerofea_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("nerofea-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/nerofea".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| defaults::HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| defaults::PORT.to_string())
        .parse()
        .unwrap_or(defaults::PORT);

    // Rate limiting configuration
    // RATE_LIMIT_REQUESTS: requests per period (default: 100)
    // RATE_LIMIT_PERIOD_SECS: period in seconds (default: 60)
    let rate_limit_requests: u32 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| defaults::RATE_LIMIT_REQUESTS.to_string())
        .parse()
        .unwrap_or(defaults::RATE_LIMIT_REQUESTS);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| defaults::RATE_LIMIT_PERIOD_SECS.to_string())
        .parse()
        .unwrap_or(defaults::RATE_LIMIT_PERIOD_SECS);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if rate_limit_enabled {
            "enabled"
        } else {
            "disabled"
        },
        rate_limit_requests,
        rate_limit_period_secs
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Initialize attachment storage
    let file_storage_path =
        std::env::var("FILE_STORAGE_PATH").unwrap_or_else(|_| "/var/lib/nerofea/files".to_string());
    let db = db.with_filesystem_storage(&file_storage_path);
    info!("Attachment storage initialized at {}", file_storage_path);

    // Initialize assistant backends
    let chat = GroqBackend::from_env();
    info!("Chat backend initialized: {}", chat.model_name());
    let generation = HuggingFaceBackend::from_env();
    let web_search = TavilyBackend::from_env();

    // Create rate limiter if enabled
    let rate_limiter = if rate_limit_enabled {
        let quota = Quota::with_period(std::time::Duration::from_secs(rate_limit_period_secs))
            .expect("Rate limit period must be non-zero")
            .allow_burst(NonZeroU32::new(rate_limit_requests).expect("Rate limit must be non-zero"));
        Some(Arc::new(RateLimiter::direct(quota)))
    } else {
        None
    };

    // Create app state
    let state = AppState {
        db,
        chat: Arc::new(chat),
        generation: Arc::new(generation),
        web_search: Arc::new(web_search),
        question_cache: QuestionCache::from_env(),
        rate_limiter,
    };

    // Build router
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // OpenAPI
        .route("/openapi.yaml", get(openapi_yaml))
        // Topics CRUD
        .route("/api/v1/topics", get(list_topics).post(create_topic))
        .route(
            "/api/v1/topics/:id",
            get(get_topic).patch(update_topic).delete(delete_topic),
        )
        // Notes CRUD + search
        .route("/api/v1/notes", get(list_notes).post(create_note))
        .route("/api/v1/notes/search", get(search_notes))
        .route(
            "/api/v1/notes/:id",
            get(get_note).patch(update_note).delete(delete_note),
        )
        .route("/api/v1/notes/:id/links", get(get_note_links))
        .route("/api/v1/notes/:id/backlinks", get(get_note_backlinks))
        // Attachments
        .route(
            "/api/v1/notes/:id/attachments",
            get(list_attachments).post(upload_attachment),
        )
        .route(
            "/api/v1/attachments/:id",
            get(download_attachment).delete(delete_attachment),
        )
        // Wiki-link edges
        .route("/api/v1/links", get(list_links))
        .route("/api/v1/links/process", post(process_links))
        // Knowledge graph
        .route("/api/v1/graph", get(get_graph))
        // Assistant proxies
        .route("/api/v1/assistant/explain", post(assistant_explain))
        .route("/api/v1/assistant/research", post(assistant_research))
        .route("/api/v1/assistant/generate", post(assistant_generate))
        // Question catalog
        .route("/api/v1/questions", get(list_questions))
        .route("/api/v1/questions/refresh", post(refresh_questions))
        // Study plans
        .route(
            "/api/v1/study-plans",
            get(list_study_plans).post(save_study_plan),
        )
        .route("/api/v1/study-plans/generate", post(generate_study_plan))
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(
            defaults::MAX_UPLOAD_SIZE_BYTES + 1024 * 1024,
        ))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}

// =============================================================================
// RATE LIMITING
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            return ApiError::TooManyRequests("Rate limit exceeded".to_string()).into_response();
        }
    }
    next.run(request).await
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// TOPIC HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserScopeQuery {
    user_id: Option<String>,
}

async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<UserScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let topics = state.db.topics.list(query.user_id.as_deref()).await?;
    Ok(Json(topics))
}

async fn get_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = state.db.topics.fetch(id).await?;
    Ok(Json(topic))
}

#[derive(Debug, Deserialize)]
struct CreateTopicBody {
    title: String,
    user_id: String,
}

/// Validate a user-supplied title (topics and notes share the same rule).
fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    if title.len() > 255 {
        return Err(ApiError::BadRequest(
            "Title must be at most 255 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_user_id(user_id: &str) -> Result<(), ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    Ok(())
}

async fn create_topic(
    State(state): State<AppState>,
    Json(body): Json<CreateTopicBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&body.title)?;
    validate_user_id(&body.user_id)?;

    let topic = state
        .db
        .topics
        .insert(CreateTopicRequest {
            title: body.title,
            user_id: body.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(topic)))
}

#[derive(Debug, Deserialize)]
struct UpdateTopicBody {
    title: String,
}

async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTopicBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&body.title)?;
    state.db.topics.rename(id, &body.title).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Topic updated successfully"
    })))
}

async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.topics.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Topic deleted successfully"
    })))
}

// =============================================================================
// NOTE HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListNotesQuery {
    topic_id: Option<Uuid>,
    user_id: Option<String>,
}

async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notes = state
        .db
        .notes
        .list(ListNotesRequest {
            topic_id: query.topic_id,
            user_id: query.user_id,
        })
        .await?;
    Ok(Json(notes))
}

async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.db.notes.fetch(id).await?;
    Ok(Json(note))
}

#[derive(Debug, Deserialize)]
struct CreateNoteBody {
    topic_id: Uuid,
    title: String,
    #[serde(default)]
    content: String,
    user_id: String,
}

async fn create_note(
    State(state): State<AppState>,
    Json(body): Json<CreateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_title(&body.title)?;
    validate_user_id(&body.user_id)?;

    if !state.db.topics.exists(body.topic_id).await? {
        return Err(ApiError::BadRequest(format!(
            "Topic {} does not exist",
            body.topic_id
        )));
    }

    let note = state
        .db
        .notes
        .insert(CreateNoteRequest {
            topic_id: body.topic_id,
            title: body.title,
            content: body.content,
            user_id: body.user_id,
        })
        .await?;

    spawn_link_resync(state.db.clone(), note.clone());

    Ok((StatusCode::CREATED, Json(note)))
}

#[derive(Debug, Deserialize)]
struct UpdateNoteBody {
    topic_id: Option<Uuid>,
    title: Option<String>,
    content: Option<String>,
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &body.title {
        validate_title(title)?;
    }

    let content_changed = body.content.is_some();
    let note = state
        .db
        .notes
        .update(
            id,
            UpdateNoteRequest {
                topic_id: body.topic_id,
                title: body.title,
                content: body.content,
            },
        )
        .await?;

    // Re-resolve wiki-links when content changed
    if content_changed {
        spawn_link_resync(state.db.clone(), note.clone());
    }

    Ok(Json(note))
}

async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.notes.delete(id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Note deleted successfully"
    })))
}

#[derive(Debug, Deserialize)]
struct SearchNotesQuery {
    q: String,
    user_id: Option<String>,
}

async fn search_notes(
    State(state): State<AppState>,
    Query(query): Query<SearchNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::BadRequest("Search query is required".to_string()));
    }
    let notes = state
        .db
        .notes
        .search(&query.q, query.user_id.as_deref())
        .await?;
    Ok(Json(notes))
}

async fn get_note_links(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let links = state.db.links.get_outgoing(id).await?;
    Ok(Json(links))
}

async fn get_note_backlinks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let links = state.db.links.get_incoming(id).await?;
    Ok(Json(links))
}

// =============================================================================
// LINK HANDLERS
// =============================================================================

async fn list_links(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let links = state.db.links.list_all().await?;
    Ok(Json(links))
}

#[derive(Debug, Deserialize)]
struct ProcessLinksBody {
    note_id: Uuid,
}

async fn process_links(
    State(state): State<AppState>,
    Json(body): Json<ProcessLinksBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state.db.notes.fetch(body.note_id).await?;
    let count = state.db.links.resync(&note).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": format!("Successfully processed {} links", count),
        "links": count
    })))
}

// =============================================================================
// GRAPH HANDLER
// =============================================================================

async fn get_graph(
    State(state): State<AppState>,
    Query(query): Query<UserScopeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let graph = state.db.links.graph(query.user_id.as_deref()).await?;
    Ok(Json(graph))
}

// =============================================================================
// QUESTION HANDLERS
// =============================================================================

async fn list_questions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let questions = state
        .question_cache
        .get_or_fetch(&state.db.questions)
        .await?;
    Ok(Json(questions))
}

async fn refresh_questions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.question_cache.invalidate().await;
    let questions = state
        .question_cache
        .get_or_fetch(&state.db.questions)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "count": questions.len()
    })))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub(crate) enum ApiError {
    Internal(nerofea_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    TooManyRequests(String),
}

impl From<nerofea_core::Error> for ApiError {
    fn from(err: nerofea_core::Error) -> Self {
        use nerofea_core::Error;
        match &err {
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::NoteNotFound(id) => ApiError::NotFound(format!("Note {} not found", id)),
            Error::TopicNotFound(id) => ApiError::NotFound(format!("Topic {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::UploadRejected(msg) => ApiError::BadRequest(msg.clone()),
            Error::Plan(msg) => ApiError::BadRequest(msg.clone()),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Internal(err)
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
