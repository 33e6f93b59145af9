use hookline::providers::base::Provider;
use std::sync::Arc;

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub model_id: String,
}
