use headshot_application::AppContext;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
