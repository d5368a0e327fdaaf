use std::sync::Arc;

use responder_core::paging::{PageParams, PageRequest};
use responder_core::repository::{OutgoingIntentRepository, TemplateRepository};
use responder_core::restore::RestoreService;
use responder_core::template_store::TemplateStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Message template writes, reads and history.
    pub templates: TemplateStore,
    /// Restores templates to earlier versions.
    pub restorer: RestoreService,
    /// Outgoing intents, the parents of templates.
    pub intents: Arc<dyn OutgoingIntentRepository>,
}

impl AppState {
    /// Wire the services over one storage backend that serves both intents
    /// and templates.
    pub fn new<S>(storage: Arc<S>, config: ServerConfig) -> Self
    where
        S: TemplateRepository + OutgoingIntentRepository + 'static,
    {
        let templates = TemplateStore::with_default_rules(storage.clone());
        let restorer = RestoreService::new(templates.clone());
        Self {
            config: Arc::new(config),
            templates,
            restorer,
            intents: storage,
        }
    }

    /// Resolve list query parameters against the configured default page size.
    pub fn page(&self, params: &PageParams) -> PageRequest {
        PageRequest::new(params.page, params.per_page, self.config.default_page_size)
    }
}
