use std::sync::Arc;

use crate::analysis::cache::AnalysisCache;
use crate::analysis::orchestrator::Orchestrator;
use crate::config::Config;
use crate::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// The pool lives inside the store; handlers never touch the database directly.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CandidateStore>,
    pub cache: Arc<AnalysisCache>,
    pub orchestrator: Arc<Orchestrator>,
    pub config: Config,
}
