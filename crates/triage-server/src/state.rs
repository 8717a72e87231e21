use std::sync::Arc;

use tokio::sync::RwLock;
use triage_core::HistoryEntry;
use triage_llm::CompletionAgent;
use triage_monitor::MetricsRegistry;

/// Shared state injected into every handler.
pub struct ServerState {
    pub agent: Arc<dyn CompletionAgent>,
    pub metrics: MetricsRegistry,
    history: RwLock<Vec<HistoryEntry>>,
}

impl ServerState {
    pub fn new(agent: Arc<dyn CompletionAgent>, metrics: MetricsRegistry) -> Self {
        Self {
            agent,
            metrics,
            history: RwLock::new(Vec::new()),
        }
    }

    /// Appends an entry. History is never trimmed.
    pub async fn add_history(&self, entry: HistoryEntry) {
        self.history.write().await.push(entry);
    }

    /// Snapshot of the full history, oldest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.clone()
    }
}
