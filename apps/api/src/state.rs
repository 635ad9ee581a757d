use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::llm_client::Completion;
use crate::session::ReviewSession;
use crate::source::TableExport;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single review session of this process. Handlers hold the lock for
    /// the whole action, so generation batches never overlap.
    pub session: Arc<Mutex<ReviewSession>>,
    /// Completion backend. Default: `LlmClient` against the OpenAI API.
    pub llm: Arc<dyn Completion>,
    /// Review table backend. Keboola Storage API, or a CSV directory when DATA_DIR is set.
    pub source: Arc<dyn TableExport>,
    pub config: Config,
}
