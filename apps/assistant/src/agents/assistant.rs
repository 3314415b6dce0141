//! HrAssistant runs one conversational turn: route, then converse or delegate to
//! a generator agent.

use std::sync::Arc;

use serde::Serialize;

use crate::agents::{ChecklistAgent, JdAgent};
use crate::conversation::{AgentKind, ChatbotAgent, ConversationState, RouterOutcome};
use crate::llm_client::{LanguageModel, LlmError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantReply {
    pub agent: AgentKind,
    pub message: String,
}

#[derive(Clone)]
pub struct HrAssistant {
    router: ChatbotAgent,
    jd_agent: JdAgent,
    checklist_agent: ChecklistAgent,
}

impl HrAssistant {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            router: ChatbotAgent::new(llm.clone()),
            jd_agent: JdAgent::new(llm.clone()),
            checklist_agent: ChecklistAgent::new(llm),
        }
    }

    /// Handles one user message. The reply is also appended to `state`.
    /// Generator failures come back as reply text; only a failed
    /// conversational call is an error.
    pub async fn invoke(
        &self,
        state: &mut ConversationState,
        input: &str,
    ) -> Result<AssistantReply, LlmError> {
        let (agent, message) = match self.router.process_input(state, input).await? {
            RouterOutcome::Replied(message) => (AgentKind::Chatbot, message),
            RouterOutcome::GenerateJobDescription => {
                (AgentKind::JdAgent, self.jd_agent.respond(state).await)
            }
            RouterOutcome::GenerateChecklist => (
                AgentKind::ChecklistAgent,
                self.checklist_agent.respond(state).await,
            ),
        };
        state.current_agent = Some(agent);
        Ok(AssistantReply { agent, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::prompts::{CHECKLIST_SYSTEM, JD_SYSTEM};
    use crate::conversation::prompts::{CHATBOT_SYSTEM, EXTRACTION_SYSTEM};
    use crate::conversation::state::Role;
    use crate::llm_client::testing::ScriptedModel;

    const JD_JSON: &str = r#"{"title": "Support Engineer", "summary": "Help customers.",
        "requirements": ["Zendesk"], "application_process": "Email us."}"#;
    const CHECKLIST_JSON: &str = r#"{"steps": [{"name": "Post"}], "estimated_timeline": "4 weeks"}"#;

    fn scripted() -> ScriptedModel {
        ScriptedModel::new()
            .reply_when(JD_SYSTEM, JD_JSON)
            .reply_when(CHECKLIST_SYSTEM, CHECKLIST_JSON)
            .reply_when(CHATBOT_SYSTEM, "Which skills matter most?")
    }

    #[tokio::test]
    async fn test_full_conversation_produces_jd_then_checklist() {
        let llm = Arc::new(scripted().reply_when(
            EXTRACTION_SYSTEM,
            r#"{"role": "Support Engineer", "skills": []}"#,
        ));
        let assistant = HrAssistant::new(llm);
        let mut state = ConversationState::new();

        let first = assistant
            .invoke(&mut state, "I'm hiring a support engineer")
            .await
            .unwrap();
        assert_eq!(first.agent, AgentKind::Chatbot);
        assert_eq!(first.message, "Which skills matter most?");

        state.required_skills.push("Zendesk".into());
        let jd = assistant
            .invoke(&mut state, "Please write the job description")
            .await
            .unwrap();
        assert_eq!(jd.agent, AgentKind::JdAgent);
        assert!(jd.message.starts_with("# Support Engineer"));
        assert!(state.jd_generated);
        assert_eq!(state.current_agent, Some(AgentKind::JdAgent));

        let checklist = assistant
            .invoke(&mut state, "Now the hiring checklist")
            .await
            .unwrap();
        assert_eq!(checklist.agent, AgentKind::ChecklistAgent);
        assert!(checklist
            .message
            .starts_with("# Hiring Process Checklist for Support Engineer"));
        assert!(state.checklist_generated);

        let roles: Vec<Role> = state.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::Human, Role::Ai, Role::Human, Role::Ai, Role::Human, Role::Ai]
        );
    }

    #[tokio::test]
    async fn test_generator_failure_is_a_reply_not_an_error() {
        let llm = Arc::new(ScriptedModel::new().fail_when(JD_SYSTEM, "quota exceeded"));
        let assistant = HrAssistant::new(llm);
        let mut state = ConversationState::new();
        state.current_role = Some("Analyst".into());
        state.required_skills.push("SQL".into());

        let reply = assistant.invoke(&mut state, "draft a JD").await.unwrap();
        assert_eq!(reply.agent, AgentKind::JdAgent);
        assert!(reply.message.starts_with("Error generating job description:"));
        assert!(!state.jd_generated);
    }
}
