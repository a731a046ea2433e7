//! Per-process handles shared by all show flows
//!
//! Holds no request state: every flow re-reads the stores and files it needs.

use crate::config::ShowClientConfig;
use crate::db::DataSource;
use crate::host::HostFs;
use std::sync::Arc;

/// Backing store, host filesystem and configuration used by the flows.
#[derive(Clone)]
pub struct ShowContext {
    db: Arc<dyn DataSource>,
    host: Arc<dyn HostFs>,
    config: ShowClientConfig,
}

impl ShowContext {
    pub fn new(db: Arc<dyn DataSource>, host: Arc<dyn HostFs>, config: ShowClientConfig) -> Self {
        Self { db, host, config }
    }

    pub fn db(&self) -> &dyn DataSource {
        self.db.as_ref()
    }

    pub fn host(&self) -> &dyn HostFs {
        self.host.as_ref()
    }

    pub fn config(&self) -> &ShowClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for ShowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
