pub mod prompts;
pub mod router;
pub mod state;

pub use router::{ChatbotAgent, RouterOutcome};
pub use state::{AgentKind, ConversationState};
