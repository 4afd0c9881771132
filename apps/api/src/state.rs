use std::sync::Arc;

use crate::assist::AiAssist;
use crate::config::Config;
use crate::layout::PageConfig;
use crate::wizard::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    /// Unconfigured when no Gemini key is set; every AI call then returns 503.
    pub assist: AiAssist,
    pub config: Arc<Config>,
    /// PDF page geometry: A4, Helvetica 11pt.
    pub page_config: Arc<PageConfig>,
}

impl AppState {
    pub fn new(config: Config, assist: AiAssist, page_config: PageConfig) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            assist,
            config: Arc::new(config),
            page_config: Arc::new(page_config),
        }
    }
}
