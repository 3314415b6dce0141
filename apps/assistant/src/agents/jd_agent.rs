use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::prompts::{JD_PROMPT_TEMPLATE, JD_SYSTEM};
use crate::agents::{or_not_specified, AgentError};
use crate::conversation::ConversationState;
use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::LanguageModel;
use crate::models::job_description::JobDescription;

pub const MISSING_ROLE_OR_SKILLS: &str =
    "I need more information about the role and required skills to generate a job description.";

#[derive(Clone)]
pub struct JdAgent {
    llm: Arc<dyn LanguageModel>,
}

impl JdAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Generates a job description from the gathered hiring details.
    /// Requires a role and at least one skill. Issues exactly one model call.
    pub async fn generate(&self, state: &ConversationState) -> Result<JobDescription, AgentError> {
        let role = match &state.current_role {
            Some(role) if !state.required_skills.is_empty() => role,
            _ => return Err(AgentError::MissingInformation(MISSING_ROLE_OR_SKILLS.to_string())),
        };

        let skills = state.required_skills.join(", ");
        let company_info = state.company_info_text();
        let prompt = render(
            JD_PROMPT_TEMPLATE,
            &[
                ("role", role),
                ("skills", &skills),
                ("experience", or_not_specified(state.experience_level.as_deref())),
                ("budget", or_not_specified(state.budget_range.as_deref())),
                ("company_info", &company_info),
            ],
        );

        info!("Generating job description for role '{role}'");
        let jd: JobDescription = self.llm.call_json(&prompt, &json_system(JD_SYSTEM)).await?;
        Ok(jd)
    }

    /// Conversation step: appends the rendered job description (or the error
    /// text) to the history and returns it. Only success flips `jd_generated`.
    pub async fn respond(&self, state: &mut ConversationState) -> String {
        let reply = match self.generate(state).await {
            Ok(jd) => {
                state.jd_generated = true;
                jd.to_markdown()
            }
            Err(AgentError::MissingInformation(message)) => message,
            Err(e) => {
                warn!("Job description generation failed: {e}");
                format!("Error generating job description: {e}")
            }
        };
        state.push_ai(reply.clone());
        reply
    }
}
