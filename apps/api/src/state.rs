use std::sync::Arc;

use crate::applications::store::ApplicationStore;
use crate::importer::pipeline::Importer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: ApplicationStore,
    /// Import pipeline wired to the page fetcher and extraction client chosen at startup.
    pub importer: Arc<Importer>,
}
