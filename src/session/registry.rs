//! Explicit registry of named sessions
//!
//! Callers that monitor one broker use the default key; everything else
//! goes through [`SessionRegistry::connect`] and [`SessionRegistry::get`]
//! with a key of their choosing.

use super::{connect, ConnectionInfo};
use crate::config::CollectorConfig;
use crate::error::{ConnectError, MetricError, MetricResult};
use crate::transport::Transport;
use std::collections::BTreeMap;
use tracing::info;

/// Key of the session used by the `*_default` helpers
pub const DEFAULT_SESSION_KEY: &str = "";

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, ConnectionInfo>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a session and register it under `key`
    pub async fn connect(
        &mut self,
        key: &str,
        transport: Box<dyn Transport>,
        config: CollectorConfig,
    ) -> Result<&mut ConnectionInfo, ConnectError> {
        if self.sessions.contains_key(key) {
            return Err(ConnectError::AlreadyConnected(key.to_string()));
        }
        let conn = connect(key, transport, config).await?;
        Ok(self.sessions.entry(key.to_string()).or_insert(conn))
    }

    pub async fn connect_default(
        &mut self,
        transport: Box<dyn Transport>,
        config: CollectorConfig,
    ) -> Result<&mut ConnectionInfo, ConnectError> {
        self.connect(DEFAULT_SESSION_KEY, transport, config).await
    }

    pub fn get(&self, key: &str) -> MetricResult<&ConnectionInfo> {
        self.sessions
            .get(key)
            .ok_or_else(|| MetricError::UnknownSession(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> MetricResult<&mut ConnectionInfo> {
        self.sessions
            .get_mut(key)
            .ok_or_else(|| MetricError::UnknownSession(key.to_string()))
    }

    pub fn get_default(&self) -> MetricResult<&ConnectionInfo> {
        self.get(DEFAULT_SESSION_KEY)
    }

    pub fn get_default_mut(&mut self) -> MetricResult<&mut ConnectionInfo> {
        self.get_mut(DEFAULT_SESSION_KEY)
    }

    /// Disconnect and forget one session
    pub async fn disconnect(&mut self, key: &str) -> MetricResult<()> {
        let mut conn = self
            .sessions
            .remove(key)
            .ok_or_else(|| MetricError::UnknownSession(key.to_string()))?;
        conn.disconnect().await;
        Ok(())
    }

    /// Disconnect every session
    pub async fn disconnect_all(&mut self) {
        let count = self.sessions.len();
        for (_, mut conn) in std::mem::take(&mut self.sessions) {
            conn.disconnect().await;
        }
        if count > 0 {
            info!(sessions = count, "All sessions disconnected");
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
