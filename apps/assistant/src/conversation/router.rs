//! Agent router: decides, after every user message, whether to hand off to a
//! generator agent or reply conversationally.
//!
//! The decision is a small finite-state model: the conversation's
//! `ConversationPhase` says which documents are reachable, and keyword
//! triggers over the most recent human messages fire the transition.
//! Only role (and skills, for the JD) gate generation. Experience level,
//! budget and timeline are asked for but never required.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::conversation::prompts::{
    CHATBOT_SYSTEM, CONVERSE_PROMPT_TEMPLATE, EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM,
};
use crate::conversation::state::{ConversationState, HiringDetails, Role};
use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::{LanguageModel, LlmError};

pub const JD_KEYWORDS: &[&str] = &[
    "job description",
    "jd",
    "posting",
    "description",
    "write a job",
];

pub const CHECKLIST_KEYWORDS: &[&str] = &["checklist", "process", "hiring plan", "steps", "timeline"];

/// Keyword matching only looks this far back in the human messages.
pub const RECENT_HUMAN_MESSAGES: usize = 3;

const TRANSCRIPT_MESSAGES: usize = 6;

/// What the conversation has gathered so far, from the router's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// No role yet. Only conversation is possible.
    NeedsRole,
    /// Role known, no skills. A checklist can be generated.
    NeedsSkills,
    /// Role and skills known. Both documents can be generated.
    ReadyToGenerate,
}

impl ConversationPhase {
    pub fn of(state: &ConversationState) -> Self {
        match (&state.current_role, state.required_skills.is_empty()) {
            (None, _) => ConversationPhase::NeedsRole,
            (Some(_), true) => ConversationPhase::NeedsSkills,
            (Some(_), false) => ConversationPhase::ReadyToGenerate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    GenerateJobDescription,
    GenerateChecklist,
    Converse,
}

/// Which keyword sets appear in the recent human text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triggers {
    pub job_description: bool,
    pub checklist: bool,
}

impl Triggers {
    /// Case-insensitive substring match. No stemming, no negation handling.
    pub fn scan(text: &str) -> Self {
        let text = text.to_lowercase();
        Self {
            job_description: JD_KEYWORDS.iter().any(|k| text.contains(k)),
            checklist: CHECKLIST_KEYWORDS.iter().any(|k| text.contains(k)),
        }
    }
}

/// JD transition guard: role and skills known, JD not yet produced, JD asked for.
fn jd_guard(phase: ConversationPhase, state: &ConversationState, triggers: Triggers) -> bool {
    phase == ConversationPhase::ReadyToGenerate && !state.jd_generated && triggers.job_description
}

/// Checklist transition guard: role known, checklist not yet produced, checklist asked for.
fn checklist_guard(
    phase: ConversationPhase,
    state: &ConversationState,
    triggers: Triggers,
) -> bool {
    phase != ConversationPhase::NeedsRole && !state.checklist_generated && triggers.checklist
}

/// Pure routing decision over the current state. The JD transition wins when
/// both guards pass.
pub fn decide(state: &ConversationState) -> Route {
    let phase = ConversationPhase::of(state);
    let triggers = Triggers::scan(&state.recent_human_text(RECENT_HUMAN_MESSAGES));

    if jd_guard(phase, state, triggers) {
        Route::GenerateJobDescription
    } else if checklist_guard(phase, state, triggers) {
        Route::GenerateChecklist
    } else {
        Route::Converse
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouterOutcome {
    /// The router answered directly; the reply is already in the history.
    Replied(String),
    /// The job description agent should produce the next message.
    GenerateJobDescription,
    /// The checklist agent should produce the next message.
    GenerateChecklist,
}

/// The chatbot agent: extracts hiring details, routes, and converses.
#[derive(Clone)]
pub struct ChatbotAgent {
    llm: Arc<dyn LanguageModel>,
}

impl ChatbotAgent {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Records the user's message, updates gathered details and decides what
    /// happens next. Conversational replies are appended to the history.
    pub async fn process_input(
        &self,
        state: &mut ConversationState,
        input: &str,
    ) -> Result<RouterOutcome, LlmError> {
        state.push_human(input);
        self.update_details(state, input).await;

        let route = decide(state);
        debug!(
            "Routing decision: {:?} (phase {:?})",
            route,
            ConversationPhase::of(state)
        );

        match route {
            Route::GenerateJobDescription => Ok(RouterOutcome::GenerateJobDescription),
            Route::GenerateChecklist => Ok(RouterOutcome::GenerateChecklist),
            Route::Converse => {
                let reply = self.converse(state, input).await?;
                state.push_ai(reply.clone());
                Ok(RouterOutcome::Replied(reply))
            }
        }
    }

    /// Asks the model for hiring details in `message` and merges them.
    /// Extraction failures are logged and otherwise ignored.
    async fn update_details(&self, state: &mut ConversationState, message: &str) {
        let prompt = render(
            EXTRACTION_PROMPT_TEMPLATE,
            &[("known", &state.context_summary()), ("message", message)],
        );
        match self
            .llm
            .call_json::<HiringDetails>(&prompt, &json_system(EXTRACTION_SYSTEM))
            .await
        {
            Ok(details) => state.merge_details(details),
            Err(e) => warn!("Hiring detail extraction failed: {e}"),
        }
    }

    async fn converse(&self, state: &ConversationState, input: &str) -> Result<String, LlmError> {
        let prompt = render(
            CONVERSE_PROMPT_TEMPLATE,
            &[
                ("context", &state.context_summary()),
                ("transcript", &transcript(state)),
                ("input", input),
            ],
        );
        self.llm.complete(&prompt, CHATBOT_SYSTEM).await
    }
}

/// Prior messages (excluding the one being answered), oldest first.
fn transcript(state: &ConversationState) -> String {
    let prior = &state.messages[..state.messages.len().saturating_sub(1)];
    let start = prior.len().saturating_sub(TRANSCRIPT_MESSAGES);
    let lines: Vec<String> = prior[start..]
        .iter()
        .map(|m| match m.role {
            Role::Human => format!("User: {}", m.content),
            Role::Ai => format!("Assistant: {}", m.content),
        })
        .collect();
    if lines.is_empty() {
        "(none)".to_string()
    } else {
        lines.join("\n")
    }
}
