//! Application state for the HTTP server.

use std::sync::Arc;

use exitlinks_core::{ContentFilter, Settings};

/// Shared application state.
///
/// Read-only once the server starts. Every request derives its own site
/// origin from these settings.
#[derive(Clone)]
pub struct AppState {
    /// Site settings.
    pub settings: Arc<Settings>,
    /// Content filter built from the same settings.
    pub filter: Arc<ContentFilter>,
}

impl AppState {
    /// Creates application state from settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            filter: Arc::new(ContentFilter::new(settings.clone())),
            settings: Arc::new(settings),
        }
    }

    /// Returns the URL the error page links back to.
    pub fn home_url(&self) -> String {
        self.settings
            .origin()
            .map(|origin| format!("{}/", origin.base()))
            .unwrap_or_else(|_| "/".to_string())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
