//! Shared server state

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::session::SessionStore;

/// State handed to every handler
pub struct TodoServer {
    /// Per-session item stores
    pub sessions: Arc<SessionStore>,

    /// Server configuration
    pub server_config: ServerConfig,
}

impl TodoServer {
    /// Open storage under `server_config.storage_path`
    pub fn new(server_config: ServerConfig) -> Result<Self> {
        std::fs::create_dir_all(&server_config.storage_path).with_context(|| {
            format!(
                "Failed to create storage directory {:?}",
                server_config.storage_path
            )
        })?;

        let sessions = Arc::new(SessionStore::open(
            &server_config.storage_path,
            server_config.session_ttl(),
        )?);
        info!(
            sessions = sessions.session_count(),
            "Todo server state initialized"
        );

        Ok(Self {
            sessions,
            server_config,
        })
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.server_config
    }

    /// Name of the session cookie
    pub fn session_cookie(&self) -> &str {
        &self.server_config.session_cookie
    }

    /// Zone for due-date parsing and timestamp rendering
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.server_config.timezone
    }

    /// Drop sessions idle for longer than the configured TTL
    pub fn run_session_maintenance(&self) -> usize {
        match self.sessions.sweep_expired(chrono::Utc::now()) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!("Session sweep failed: {}", e);
                0
            }
        }
    }

    /// Flush all RocksDB databases
    pub fn flush_all_databases(&self) -> Result<()> {
        info!("Flushing session database to disk...");
        self.sessions.flush()?;
        info!("  Session database flushed");
        Ok(())
    }
}
