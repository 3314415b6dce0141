use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::agents::{HrAssistant, JdAgent, ResumeAnalyzer};
use crate::conversation::ConversationState;
use crate::llm_client::LanguageModel;
use crate::ml::embedding::Embedder;
use crate::ml::knowledge_graph::KnowledgeGraph;
use crate::ml::ner::NerModel;
use crate::storage::ObjectStore;
use crate::tracker::ApplicationTracker;

pub type SharedSession = Arc<Mutex<ConversationState>>;

/// Sessions untouched for this long are dropped the next time a session is
/// looked up.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

pub struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub assistant: HrAssistant,
    pub jd_agent: JdAgent,
    pub resume_analyzer: ResumeAnalyzer,
    pub ner: NerModel,
    pub embedder: Arc<dyn Embedder>,
    /// Single in-process writer for the applications file.
    pub tracker: Arc<Mutex<ApplicationTracker>>,
    /// Chat sessions by id. Each session is locked for the length of a turn.
    pub sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    pub graph: Arc<RwLock<KnowledgeGraph>>,
    /// Uploads are copied here when object storage is configured.
    pub storage: Option<ObjectStore>,
    /// Serve the chat page at `/` (web mode).
    pub web_ui: bool,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
        tracker: ApplicationTracker,
    ) -> Self {
        Self {
            assistant: HrAssistant::new(llm.clone()),
            jd_agent: JdAgent::new(llm.clone()),
            resume_analyzer: ResumeAnalyzer::new(llm.clone()),
            ner: NerModel::new(llm),
            embedder,
            tracker: Arc::new(Mutex::new(tracker)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            graph: Arc::new(RwLock::new(KnowledgeGraph::new())),
            storage: None,
            web_ui: false,
        }
    }

    pub fn with_storage(mut self, storage: Option<ObjectStore>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_web_ui(mut self, web_ui: bool) -> Self {
        self.web_ui = web_ui;
        self
    }

    /// The session for `id`, created empty when unknown. With no id a new
    /// session is started. Idle sessions are evicted first.
    pub async fn session(&self, id: Option<Uuid>) -> (Uuid, SharedSession) {
        let id = id.unwrap_or_else(Uuid::new_v4);
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|key, entry| {
            *key == id || now.duration_since(entry.last_used) < SESSION_IDLE_TTL
        });
        if sessions.len() < before {
            debug!("Evicted {} idle session(s)", before - sessions.len());
        }

        let entry = sessions.entry(id).or_insert_with(|| SessionEntry {
            session: Arc::new(Mutex::new(ConversationState::for_session(id))),
            last_used: now,
        });
        entry.last_used = now;
        (id, entry.session.clone())
    }

    pub async fn existing_session(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_used = Instant::now();
        Some(entry.session.clone())
    }

    /// Forgets a session. Returns whether it existed.
    pub async fn remove_session(&self, id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        removed
    }
}
