use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::conversation::AgentKind;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<Uuid>,
    pub message: String,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub agent: AgentKind,
    pub message: String,
    pub jd_generated: bool,
    pub checklist_generated: bool,
    pub missing_fields: Vec<&'static str>,
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let (session_id, session) = state.session(req.session_id).await;
    let mut conversation = session.lock().await;
    if req.user_id.is_some() {
        conversation.user_id = req.user_id;
    }

    let reply = state
        .assistant
        .invoke(&mut conversation, message)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;
    info!("Session {session_id}: {:?} replied", reply.agent);

    Ok(Json(ChatResponse {
        session_id,
        agent: reply.agent,
        message: reply.message,
        jd_generated: conversation.jd_generated,
        checklist_generated: conversation.checklist_generated,
        missing_fields: conversation.missing_fields(),
    }))
}

/// POST /api/v1/chat/:session_id/reset
/// Starts the conversation over. Company info is kept.
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = state
        .existing_session(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
    session.lock().await.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/chat/:session_id
/// Drops the session and everything it remembers.
pub async fn handle_end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.remove_session(session_id).await {
        return Err(AppError::NotFound(format!("Session {session_id} not found")));
    }
    info!("Session {session_id} ended");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::agents::prompts::CHECKLIST_SYSTEM;
    use crate::conversation::prompts::{CHATBOT_SYSTEM, EXTRACTION_SYSTEM};
    use crate::llm_client::testing::ScriptedModel;
    use crate::routes::build_router;
    use crate::routes::test_support::{json_request, send, test_state};

    fn scripted() -> ScriptedModel {
        ScriptedModel::new()
            .reply_when(
                EXTRACTION_SYSTEM,
                r#"{"role": "Recruiter", "company_info": {"name": "Globex"}}"#,
            )
            .reply_when(CHATBOT_SYSTEM, "What skills should they have?")
            .reply_when(
                CHECKLIST_SYSTEM,
                r#"{"steps": [{"name": "Kickoff"}], "estimated_timeline": "3 weeks"}"#,
            )
    }

    #[tokio::test]
    async fn test_chat_keeps_session_state() {
        let (state, _dir) = test_state(scripted());

        let (status, first) = send(
            build_router(state.clone()),
            json_request("POST", "/api/v1/chat", json!({"message": "Hiring a recruiter"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["agent"], "chatbot");
        assert_eq!(first["message"], "What skills should they have?");
        let session_id = first["session_id"].as_str().unwrap().to_string();

        let (_, second) = send(
            build_router(state.clone()),
            json_request(
                "POST",
                "/api/v1/chat",
                json!({"session_id": session_id, "message": "Give me the hiring checklist"}),
            ),
        )
        .await;
        assert_eq!(second["agent"], "checklist_agent");
        assert_eq!(second["checklist_generated"], true);
        assert_eq!(second["session_id"], session_id);
    }

    #[tokio::test]
    async fn test_reset_keeps_company_info() {
        let (state, _dir) = test_state(scripted());
        let (_, first) = send(
            build_router(state.clone()),
            json_request("POST", "/api/v1/chat", json!({"message": "Hiring a recruiter"})),
        )
        .await;
        let session_id: Uuid = first["session_id"].as_str().unwrap().parse().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/chat/{session_id}/reset"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(build_router(state.clone()), request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let session = state.existing_session(session_id).await.unwrap();
        let conversation = session.lock().await;
        assert!(conversation.messages.is_empty());
        assert!(conversation.current_role.is_none());
        assert_eq!(conversation.company_info["name"], "Globex");
    }

    #[tokio::test]
    async fn test_reset_unknown_session_is_not_found() {
        let (state, _dir) = test_state(scripted());
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/chat/{}/reset", Uuid::new_v4()))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_removes_the_session() {
        let (state, _dir) = test_state(scripted());
        let (_, first) = send(
            build_router(state.clone()),
            json_request("POST", "/api/v1/chat", json!({"message": "Hiring a recruiter"})),
        )
        .await;
        let session_id: Uuid = first["session_id"].as_str().unwrap().parse().unwrap();
        assert_eq!(state.sessions.lock().await.len(), 1);

        let delete = |id: Uuid| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/chat/{id}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = send(build_router(state.clone()), delete(session_id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.lock().await.is_empty());
        assert!(state.existing_session(session_id).await.is_none());

        let (status, _) = send(build_router(state), delete(session_id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (state, _dir) = test_state(scripted());
        let (status, _) = send(
            build_router(state),
            json_request("POST", "/api/v1/chat", json!({"message": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
