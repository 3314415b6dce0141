// Prompt constants for the conversational router.

/// System prompt for conversational replies.
pub const CHATBOT_SYSTEM: &str = "You are an AI HR assistant that helps with hiring processes. \
    Your role is to: \
    1. Ask clarifying questions about the role, required skills, experience level, budget, and timeline \
    2. Route requests to appropriate specialized agents (JD writer, checklist generator) \
    3. Provide helpful guidance about hiring best practices. \
    Be professional, engaging, and focused on gathering complete information before \
    generating outputs. Always confirm you have all needed information before proceeding.";

/// Conversational prompt. Replace `{context}`, `{transcript}` and `{input}`.
pub const CONVERSE_PROMPT_TEMPLATE: &str = "{context}
Recent messages:
{transcript}

User: {input}";

/// System prompt for hiring-detail extraction.
pub const EXTRACTION_SYSTEM: &str =
    "You extract hiring parameters from a recruiter's chat message for an HR assistant.";

/// Extraction prompt. Replace `{known}` and `{message}`.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Known hiring details so far:
{known}

New message from the user:
"{message}"

Return a JSON object with this EXACT schema. Use null or [] for anything the
new message does not state. Do not repeat known details unless the message changes them.
{
  "role": "Senior Backend Engineer",
  "skills": ["Go", "PostgreSQL"],
  "experience_level": "5+ years",
  "budget_range": "$140,000 - $170,000",
  "hiring_timeline": "Start within 6 weeks",
  "company_info": {"name": "Acme", "industry": "Fintech"}
}"#;
