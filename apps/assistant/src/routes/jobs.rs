use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversation::ConversationState;
use crate::errors::AppError;
use crate::models::job_description::JobDescription;
use crate::parsing::job_parser::{parse_job, ParsedJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateJobDescriptionRequest {
    pub role: String,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub budget_range: Option<String>,
    #[serde(default)]
    pub company_info: Map<String, Value>,
}

#[derive(Serialize)]
pub struct GenerateJobDescriptionResponse {
    pub success: bool,
    pub job_description: JobDescription,
    pub markdown: String,
}

/// POST /api/v1/generate-job-description
pub async fn handle_generate_job_description(
    State(state): State<AppState>,
    Json(req): Json<GenerateJobDescriptionRequest>,
) -> Result<Json<GenerateJobDescriptionResponse>, AppError> {
    let mut conversation = ConversationState::new();
    conversation.current_role = Some(req.role.trim().to_string()).filter(|r| !r.is_empty());
    conversation.required_skills = req
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    conversation.experience_level = req.experience_level;
    conversation.budget_range = req.budget_range;
    conversation.company_info = req.company_info;

    let job_description = state.jd_agent.generate(&conversation).await?;
    let markdown = job_description.to_markdown();
    Ok(Json(GenerateJobDescriptionResponse {
        success: true,
        job_description,
        markdown,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    pub text: String,
}

/// POST /api/v1/parse-job
pub async fn handle_parse_job(Json(req): Json<ParseJobRequest>) -> Json<ParsedJob> {
    Json(parse_job(&req.text))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::agents::prompts::JD_SYSTEM;
    use crate::llm_client::testing::ScriptedModel;
    use crate::routes::build_router;
    use crate::routes::test_support::{json_request, send, test_state};

    const JD_JSON: &str = r#"{"title": "ML Engineer", "department": "AI", "location": "Remote",
        "job_type": "Full-time", "salary_range": "$180k", "summary": "Ship models.",
        "responsibilities": ["Train models"], "requirements": ["PyTorch"],
        "application_process": "Apply online."}"#;

    #[tokio::test]
    async fn test_generate_job_description() {
        let llm = ScriptedModel::new().reply_when(JD_SYSTEM, JD_JSON);
        let (state, _dir) = test_state(llm);
        let (status, body) = send(
            build_router(state),
            json_request(
                "POST",
                "/api/v1/generate-job-description",
                json!({"role": "ML Engineer", "skills": ["PyTorch", "Python"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["job_description"]["title"], "ML Engineer");
        assert!(body["markdown"].as_str().unwrap().starts_with("# ML Engineer"));
    }

    #[tokio::test]
    async fn test_generate_requires_skills() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, body) = send(
            build_router(state),
            json_request(
                "POST",
                "/api/v1/generate-job-description",
                json!({"role": "ML Engineer", "skills": ["  "]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_model_failure_is_a_server_error() {
        let llm = ScriptedModel::new().fail_when(JD_SYSTEM, "down");
        let (state, _dir) = test_state(llm);
        let (status, body) = send(
            build_router(state),
            json_request(
                "POST",
                "/api/v1/generate-job-description",
                json!({"role": "ML Engineer", "skills": ["PyTorch"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_parse_job() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, body) = send(
            build_router(state),
            json_request(
                "POST",
                "/api/v1/parse-job",
                json!({"text": "Staff Designer\nRemote\n$140,000 - $160,000"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Staff Designer");
        assert_eq!(body["location"], "Remote");
        assert_eq!(body["salary"], "$140,000 - $160,000");
    }
}
