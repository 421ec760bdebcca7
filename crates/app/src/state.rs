//! Application state management

use std::sync::Arc;

use finagent_core::{ClientConfig, Database, KeyValueStore, SessionContext};
use finagent_net::{CountingNavigator, FinanceApi};
use tracing::info;

use crate::error::Result;

/// Main application state
pub struct AppState {
    pub config: ClientConfig,
    pub session: Arc<SessionContext>,
    pub api: Arc<FinanceApi>,
    /// Redirects requested by the gateway since the last check
    pub navigator: Arc<CountingNavigator>,
}

impl AppState {
    /// Open the session database under the configured data dir
    pub fn new(config: ClientConfig) -> Result<Self> {
        let db_path = config.database_path()?;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(finagent_core::Error::from)?;
        }

        let db = Database::open(&db_path)?;
        info!(path = %db_path.display(), api = %config.api_url, "Session store opened");
        Self::with_store(config, Arc::new(db))
    }

    /// State over a volatile store
    #[cfg(test)]
    pub fn in_memory(config: ClientConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(finagent_core::MemoryStore::new()))
    }

    fn with_store(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let session = Arc::new(SessionContext::init(store)?);
        let navigator = Arc::new(CountingNavigator::new());
        let api = Arc::new(FinanceApi::connect(
            &config,
            session.clone(),
            navigator.clone(),
        )?);

        Ok(Self {
            config,
            session,
            api,
            navigator,
        })
    }

    /// Whether the gateway dropped the session since the last call
    pub fn take_redirect(&self) -> bool {
        self.navigator.take() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_database_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            data_dir: Some(dir.path().join("nested")),
            ..ClientConfig::default()
        };

        let state = AppState::new(config).unwrap();
        assert!(dir.path().join("nested").join("finagent.db").exists());
        assert!(!state.session.is_authenticated());
        assert!(!state.take_redirect());
    }
}
