pub mod applications;
pub mod chat;
pub mod health;
pub mod jobs;
pub mod ml;
pub mod resume;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;

/// Upload limit for resume files.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::index_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::health_handler))
        // Documents
        .route("/api/v1/parse-resume", post(resume::handle_parse_resume))
        .route("/api/v1/analyze-resume", post(resume::handle_analyze_resume))
        .route(
            "/api/v1/generate-job-description",
            post(jobs::handle_generate_job_description),
        )
        .route("/api/v1/parse-job", post(jobs::handle_parse_job))
        // Conversation
        .route("/api/v1/chat", post(chat::handle_chat))
        .route("/api/v1/chat/:session_id", delete(chat::handle_end_session))
        .route(
            "/api/v1/chat/:session_id/reset",
            post(chat::handle_reset_session),
        )
        // Application tracker
        .route(
            "/api/v1/applications",
            post(applications::handle_create).get(applications::handle_list),
        )
        .route(
            "/api/v1/applications/by-status",
            get(applications::handle_by_status),
        )
        .route(
            "/api/v1/applications/followups",
            get(applications::handle_followups),
        )
        .route("/api/v1/applications/stats", get(applications::handle_stats))
        .route("/api/v1/applications/:id", get(applications::handle_get))
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/notes",
            post(applications::handle_add_note),
        )
        // ML utilities
        .route("/api/v1/rank", post(ml::handle_rank))
        .route("/api/v1/match", post(ml::handle_match))
        .route("/api/v1/extract-entities", post(ml::handle_extract_entities))
        .route("/api/v1/graph/entities", post(ml::handle_add_entity))
        .route("/api/v1/graph/relations", post(ml::handle_add_relation))
        .route("/api/v1/graph/query", post(ml::handle_query_entities))
        .route(
            "/api/v1/graph/entities/:id/relations",
            get(ml::handle_get_relations),
        )
        .route("/api/v1/graph/paths", get(ml::handle_find_paths))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
