//! Application state for the HTTP adapter.

use std::sync::Arc;

use crate::config::{ConfigLoader, EngineConfig};

/// Shared application state.
///
/// Holds the loaded engine configuration, shared read-only across all
/// request handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.config.config()
    }
}
