use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::oneshot;

use crate::{
    config::AppConfig,
    knowledge_base::KnowledgeBase,
    llm::{AnswerGenerator, QueryExpander},
};

/// Base de conocimiento compartida: `ingest`/`clear` (con su reindexado) toman
/// el lock de escritura, las consultas el de lectura.
pub type SharedKnowledgeBase = Arc<RwLock<KnowledgeBase>>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub knowledge_base: SharedKnowledgeBase,
    pub generator: Arc<dyn AnswerGenerator>,
    pub expander: Arc<dyn QueryExpander>,
    pub status: Arc<Mutex<Status>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Status {
    pub is_busy: bool,
    pub message: String,
    pub progress: f32, // Valor entre 0.0 y 1.0
}

impl Status {
    pub fn ready() -> Self {
        Self {
            is_busy: false,
            message: "Servidor listo.".to_string(),
            progress: 0.0,
        }
    }
}

pub fn lock_status(status: &Mutex<Status>) -> MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn read_kb(kb: &SharedKnowledgeBase) -> RwLockReadGuard<'_, KnowledgeBase> {
    kb.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_kb(kb: &SharedKnowledgeBase) -> RwLockWriteGuard<'_, KnowledgeBase> {
    kb.write().unwrap_or_else(PoisonError::into_inner)
}
