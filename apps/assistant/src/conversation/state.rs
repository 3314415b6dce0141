use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Which agent produced the latest turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Chatbot,
    JdAgent,
    ChecklistAgent,
}

/// Hiring details pulled out of a user message. Every field is optional; only
/// non-empty values are merged into the conversation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HiringDetails {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
    #[serde(default)]
    pub hiring_timeline: Option<String>,
    #[serde(default)]
    pub company_info: Map<String, Value>,
}

/// Per-session record of gathered hiring parameters and message history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub current_role: Option<String>,
    pub required_skills: Vec<String>,
    pub experience_level: Option<String>,
    pub budget_range: Option<String>,
    pub hiring_timeline: Option<String>,
    pub company_info: Map<String, Value>,
    pub jd_generated: bool,
    pub checklist_generated: bool,
    pub current_agent: Option<AgentKind>,
    pub user_id: Option<String>,
    pub session_id: Option<Uuid>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_session(session_id: Uuid) -> Self {
        Self {
            session_id: Some(session_id),
            ..Self::default()
        }
    }

    pub fn push_human(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            role: Role::Human,
            content: content.into(),
        });
    }

    pub fn push_ai(&mut self, content: impl Into<String>) {
        self.messages.push(Message {
            role: Role::Ai,
            content: content.into(),
        });
    }

    #[cfg(test)]
    pub fn last_ai_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Ai)
            .map(|m| m.content.as_str())
    }

    /// The last `n` human messages, oldest first, joined by spaces.
    pub fn recent_human_text(&self, n: usize) -> String {
        let mut recent: Vec<&str> = self
            .messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Human)
            .take(n)
            .map(|m| m.content.as_str())
            .collect();
        recent.reverse();
        recent.join(" ")
    }

    /// Starts over. Company info and session identity survive a reset.
    pub fn reset(&mut self) {
        *self = Self {
            company_info: std::mem::take(&mut self.company_info),
            user_id: self.user_id.take(),
            session_id: self.session_id.take(),
            ..Self::default()
        };
    }

    pub fn merge_details(&mut self, details: HiringDetails) {
        fn non_empty(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        if let Some(role) = non_empty(details.role) {
            self.current_role = Some(role);
        }
        for skill in details.skills {
            let skill = skill.trim();
            if skill.is_empty()
                || self
                    .required_skills
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(skill))
            {
                continue;
            }
            self.required_skills.push(skill.to_string());
        }
        if let Some(level) = non_empty(details.experience_level) {
            self.experience_level = Some(level);
        }
        if let Some(budget) = non_empty(details.budget_range) {
            self.budget_range = Some(budget);
        }
        if let Some(timeline) = non_empty(details.hiring_timeline) {
            self.hiring_timeline = Some(timeline);
        }
        self.company_info.extend(details.company_info);
    }

    /// Hiring parameters the assistant has not collected yet.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.current_role.is_none() {
            missing.push("role");
        }
        if self.required_skills.is_empty() {
            missing.push("required skills");
        }
        if self.experience_level.is_none() {
            missing.push("experience level");
        }
        if self.budget_range.is_none() {
            missing.push("budget");
        }
        if self.hiring_timeline.is_none() {
            missing.push("timeline");
        }
        missing
    }

    /// Summary of the known fields, used to seed conversational replies.
    pub fn context_summary(&self) -> String {
        let mut context = String::from("Conversation so far:\n");
        if let Some(role) = &self.current_role {
            context.push_str(&format!("- Role: {role}\n"));
        }
        if !self.required_skills.is_empty() {
            context.push_str(&format!(
                "- Required Skills: {}\n",
                self.required_skills.join(", ")
            ));
        }
        if let Some(level) = &self.experience_level {
            context.push_str(&format!("- Experience Level: {level}\n"));
        }
        if let Some(budget) = &self.budget_range {
            context.push_str(&format!("- Budget: {budget}\n"));
        }
        if let Some(timeline) = &self.hiring_timeline {
            context.push_str(&format!("- Timeline: {timeline}\n"));
        }
        let missing = self.missing_fields();
        if !missing.is_empty() {
            context.push_str(&format!("- Still needed: {}\n", missing.join(", ")));
        }
        context
    }

    /// Company info rendered for prompts.
    pub fn company_info_text(&self) -> String {
        if self.company_info.is_empty() {
            "Not specified".to_string()
        } else {
            Value::Object(self.company_info.clone()).to_string()
        }
    }
}
