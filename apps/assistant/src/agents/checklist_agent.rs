use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::agents::prompts::{CHECKLIST_PROMPT_TEMPLATE, CHECKLIST_SYSTEM};
use crate::agents::{or_not_specified, AgentError};
use crate::conversation::ConversationState;
use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::LanguageModel;
use crate::models::checklist::HiringChecklist;

pub const MISSING_ROLE: &str = "I need to know what role you're hiring for to create a checklist.";

#[derive(Clone)]
pub struct ChecklistAgent {
    llm: Arc<dyn LanguageModel>,
}

impl ChecklistAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Generates a hiring checklist. Requires a role; skills may be empty.
    /// The returned checklist carries the state's role and a fresh timestamp.
    pub async fn generate(&self, state: &ConversationState) -> Result<HiringChecklist, AgentError> {
        let Some(role) = &state.current_role else {
            return Err(AgentError::MissingInformation(MISSING_ROLE.to_string()));
        };

        let skills = state.required_skills.join(", ");
        let company_info = state.company_info_text();
        let prompt = render(
            CHECKLIST_PROMPT_TEMPLATE,
            &[
                ("role", role),
                ("skills", &skills),
                ("experience", or_not_specified(state.experience_level.as_deref())),
                ("timeline", or_not_specified(state.hiring_timeline.as_deref())),
                ("company_info", &company_info),
            ],
        );

        info!("Generating hiring checklist for role '{role}'");
        let mut checklist: HiringChecklist = self
            .llm
            .call_json(&prompt, &json_system(CHECKLIST_SYSTEM))
            .await?;
        checklist.role = role.clone();
        checklist.created_at = Utc::now();
        Ok(checklist)
    }

    /// Conversation step: appends the rendered checklist (or the error text)
    /// to the history and returns it. Only success flips `checklist_generated`.
    pub async fn respond(&self, state: &mut ConversationState) -> String {
        let reply = match self.generate(state).await {
            Ok(checklist) => {
                state.checklist_generated = true;
                checklist.to_markdown()
            }
            Err(AgentError::MissingInformation(message)) => message,
            Err(e) => {
                warn!("Checklist generation failed: {e}");
                format!("Error generating hiring checklist: {e}")
            }
        };
        state.push_ai(reply.clone());
        reply
    }
}
