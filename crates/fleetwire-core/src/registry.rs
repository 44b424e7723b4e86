//! Plugin registry — the explicit dependency bundle handed to envelope
//! operations.
//!
//! Rather than resolving collaborators through ambient globals, every
//! lifecycle operation that needs the security provider, connector,
//! descriptor registry, stats, or configuration receives a
//! [`PluginRegistry`]. Tests swap in mock collaborators without any
//! process-wide setup.

use crate::connector::Connector;
use crate::security::SecurityProvider;
use crate::stats::ServerStats;
use fleetwire_types::{Config, DdlRegistry};
use std::sync::Arc;

/// Shared handle to the process-wide collaborators of the message layer.
#[derive(Clone)]
pub struct PluginRegistry {
    security: Arc<dyn SecurityProvider>,
    connector: Arc<dyn Connector>,
    ddls: Arc<dyn DdlRegistry>,
    stats: Arc<ServerStats>,
    config: Config,
}

impl PluginRegistry {
    /// Bundle the collaborators for this process.
    pub fn new(
        security: Arc<dyn SecurityProvider>,
        connector: Arc<dyn Connector>,
        ddls: Arc<dyn DdlRegistry>,
        config: Config,
    ) -> Self {
        Self {
            security,
            connector,
            ddls,
            stats: Arc::new(ServerStats::new()),
            config,
        }
    }

    /// The security provider plugin.
    pub fn security(&self) -> &dyn SecurityProvider {
        self.security.as_ref()
    }

    /// The transport connector plugin.
    pub fn connector(&self) -> &dyn Connector {
        self.connector.as_ref()
    }

    /// The capability descriptor registry.
    pub fn ddls(&self) -> &dyn DdlRegistry {
        self.ddls.as_ref()
    }

    /// Global admission counters.
    pub fn stats(&self) -> &ServerStats {
        self.stats.as_ref()
    }

    /// Process configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
