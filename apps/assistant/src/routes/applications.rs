use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::ml::embedding::similarities;
use crate::models::application::{ApplicationStatus, JobApplication, JobPosting, ACTION_UPDATED};
use crate::state::AppState;
use crate::tracker::{ApplicationStats, TrackerError, UpcomingFollowup};

const DEFAULT_DAYS_AHEAD: i64 = 7;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct FollowupQuery {
    pub user_id: String,
    pub days_ahead: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: String,
    #[serde(default)]
    pub job: JobPosting,
    /// 0.0 to 1.0. When absent, computed from `resume_text` and `job_text`.
    pub resume_match: Option<f64>,
    pub resume_text: Option<String>,
    pub job_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub notes: String,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub note: String,
}

/// POST /api/v1/applications
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }
    let resume_match = match (req.resume_match, &req.resume_text, &req.job_text) {
        (Some(score), _, _) if (0.0..=1.0).contains(&score) => score,
        (Some(score), _, _) => {
            return Err(AppError::Validation(format!(
                "resume_match must be between 0 and 1, got {score}"
            )))
        }
        (None, Some(resume), Some(job)) => match_score(&state, resume, job).await,
        (None, _, _) => 0.0,
    };

    let application = state
        .tracker
        .lock()
        .await
        .add_application(&req.user_id, &req.job, resume_match)?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// Embedding similarity of resume and posting, clamped to 0..=1. Embedding
/// failures score 0 rather than failing the request.
async fn match_score(state: &AppState, resume: &str, job: &str) -> f64 {
    match similarities(state.embedder.as_ref(), resume, &[job.to_string()]).await {
        Ok(scores) => scores
            .first()
            .map(|s| f64::from(*s).clamp(0.0, 1.0))
            .unwrap_or(0.0),
        Err(e) => {
            warn!("Could not score resume match: {e}");
            0.0
        }
    }
}

/// GET /api/v1/applications?user_id=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Json<Vec<JobApplication>> {
    let tracker = state.tracker.lock().await;
    let applications = tracker
        .user_applications(&params.user_id)
        .into_iter()
        .cloned()
        .collect();
    Json(applications)
}

/// GET /api/v1/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<JobApplication>, AppError> {
    let tracker = state.tracker.lock().await;
    let application = tracker.get(id).cloned().ok_or(TrackerError::NotFound(id))?;
    Ok(Json(application))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<JobApplication>, AppError> {
    let status: ApplicationStatus = req.status.parse().map_err(TrackerError::UnknownStatus)?;
    let action = req.action.as_deref().unwrap_or(ACTION_UPDATED);
    let application = state
        .tracker
        .lock()
        .await
        .update_status(id, status, &req.notes, action)?;
    Ok(Json(application))
}

/// POST /api/v1/applications/:id/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<AddNoteRequest>,
) -> Result<Json<JobApplication>, AppError> {
    let application = state.tracker.lock().await.add_note(id, &req.note)?;
    Ok(Json(application))
}

/// GET /api/v1/applications/by-status?user_id=
pub async fn handle_by_status(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Json<BTreeMap<String, Vec<JobApplication>>> {
    let groups = state
        .tracker
        .lock()
        .await
        .applications_by_status(&params.user_id);
    Json(groups)
}

/// GET /api/v1/applications/followups?user_id=&days_ahead=
pub async fn handle_followups(
    State(state): State<AppState>,
    Query(params): Query<FollowupQuery>,
) -> Result<Json<Vec<UpcomingFollowup>>, AppError> {
    let days_ahead = params.days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD);
    if days_ahead < 0 {
        return Err(AppError::Validation(
            "days_ahead must not be negative".to_string(),
        ));
    }
    let upcoming = state
        .tracker
        .lock()
        .await
        .upcoming_followups(&params.user_id, days_ahead);
    Ok(Json(upcoming))
}

/// GET /api/v1/applications/stats?user_id=
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Json<ApplicationStats> {
    let stats = state.tracker.lock().await.stats(&params.user_id);
    Json(stats)
}
