use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::agents::resume_analyzer::AnalysisSection;
use crate::errors::AppError;
use crate::parsing::resume_parser::{extract_text, parse_resume, ParsedResume, ResumeParseError};
use crate::state::AppState;

struct Upload {
    file_name: Option<String>,
    content_type: String,
    bytes: Bytes,
}

/// Reads the `file` field of a multipart form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// Extracts the upload's text on the blocking pool; PDF extraction is CPU-bound
/// and a panic inside it surfaces as an unprocessable upload.
async fn upload_text(upload: &Upload) -> Result<String, AppError> {
    let file_name = upload.file_name.clone();
    let bytes = upload.bytes.clone();
    tokio::task::spawn_blocking(move || extract_text(file_name.as_deref(), &bytes))
        .await
        .map_err(|e| AppError::UnprocessableEntity(format!("Text extraction failed: {e}")))?
        .map_err(|e| match e {
            ResumeParseError::Empty => AppError::Validation(e.to_string()),
            ResumeParseError::Pdf(_) => AppError::UnprocessableEntity(e.to_string()),
        })
}

/// Copies the upload to object storage when configured. Storage failures are
/// logged and do not fail the request.
async fn store_upload(state: &AppState, upload: &Upload) -> Option<String> {
    let storage = state.storage.as_ref()?;
    match storage
        .put_resume(
            upload.file_name.as_deref(),
            upload.bytes.clone(),
            &upload.content_type,
        )
        .await
    {
        Ok(key) => Some(key),
        Err(e) => {
            warn!("Resume upload not stored: {e}");
            None
        }
    }
}

#[derive(Serialize)]
pub struct ParseResumeResponse {
    pub success: bool,
    pub data: ParsedResume,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
}

/// POST /api/v1/parse-resume
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ParseResumeResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let text = upload_text(&upload).await?;
    info!(
        "Parsing resume upload {:?} ({} bytes)",
        upload.file_name,
        upload.bytes.len()
    );

    let storage_key = store_upload(&state, &upload).await;
    Ok(Json(ParseResumeResponse {
        success: true,
        data: parse_resume(&text),
        storage_key,
    }))
}

#[derive(Serialize)]
pub struct AnalyzeResumeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<AnalysisSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/analyze-resume
/// Model failures are reported in the body (`success: false`), not as an
/// HTTP error.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResumeResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let text = upload_text(&upload).await?;

    let response = match state.resume_analyzer.analyze(&text).await {
        Ok(analysis) => AnalyzeResumeResponse {
            success: true,
            analysis: Some(analysis.raw),
            sections: analysis.sections,
            error: None,
        },
        Err(e) => {
            warn!("Resume analysis failed: {e}");
            AnalyzeResumeResponse {
                success: false,
                analysis: None,
                sections: Vec::new(),
                error: Some(format!("Error analyzing resume: {e}")),
            }
        }
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::agents::prompts::RESUME_ANALYSIS_SYSTEM;
    use crate::llm_client::testing::ScriptedModel;
    use crate::routes::build_router;
    use crate::routes::test_support::{json_request, multipart_request, send, test_state};

    const RESUME: &[u8] = b"Jane Doe\njane@example.com\nPython and AWS engineer, 4 years experience";

    #[tokio::test]
    async fn test_parse_resume_upload() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, body) = send(
            build_router(state),
            multipart_request("/api/v1/parse-resume", "jane.txt", RESUME),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Jane Doe");
        assert_eq!(body["data"]["emails"][0], "jane@example.com");
        assert_eq!(body["data"]["skills"]["programming"][0], "python");
        assert_eq!(body["data"]["years_experience"], 4);
        assert!(body.get("storage_key").is_none());
    }

    #[tokio::test]
    async fn test_parse_resume_requires_file_field() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, _) = send(
            build_router(state),
            json_request("POST", "/api/v1/parse-resume", serde_json::json!({})),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_blank_upload_is_a_validation_error() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, body) = send(
            build_router(state),
            multipart_request("/api/v1/parse-resume", "blank.txt", b"   "),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_truncated_pdf_is_unprocessable() {
        let (state, _dir) = test_state(ScriptedModel::new());
        let (status, body) = send(
            build_router(state),
            multipart_request(
                "/api/v1/parse-resume",
                "broken.pdf",
                b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_analyze_resume_returns_sections() {
        let llm = ScriptedModel::new().reply_when(
            RESUME_ANALYSIS_SYSTEM,
            "## Summary\nSolid cloud engineer.\n## Recommendations\nInterview.",
        );
        let (state, _dir) = test_state(llm);
        let (status, body) = send(
            build_router(state),
            multipart_request("/api/v1/analyze-resume", "jane.txt", RESUME),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sections"][0]["heading"], "Summary");
        assert_eq!(body["sections"][1]["body"], "Interview.");
    }

    #[tokio::test]
    async fn test_analyze_resume_failure_is_reported_in_body() {
        let llm = ScriptedModel::new().fail_when(RESUME_ANALYSIS_SYSTEM, "overloaded");
        let (state, _dir) = test_state(llm);
        let (status, body) = send(
            build_router(state),
            multipart_request("/api/v1/analyze-resume", "jane.txt", RESUME),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error analyzing resume:"));
    }
}
