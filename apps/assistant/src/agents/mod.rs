//! Generator agents. Each binds one prompt template to one model call and one
//! output shape. Failures are never retried inside an agent.

pub mod assistant;
pub mod checklist_agent;
pub mod jd_agent;
pub mod prompts;
pub mod resume_analyzer;

use thiserror::Error;

use crate::llm_client::LlmError;

pub use assistant::HrAssistant;
pub use checklist_agent::ChecklistAgent;
pub use jd_agent::JdAgent;
pub use resume_analyzer::ResumeAnalyzer;

#[derive(Debug, Error)]
pub enum AgentError {
    /// A precondition on the conversation state was not met. The message is
    /// shown to the user as-is.
    #[error("{0}")]
    MissingInformation(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// An optional field as prompt text, or "Not specified" when unset or blank.
pub(crate) fn or_not_specified(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("Not specified")
}
