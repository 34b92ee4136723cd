use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tracing::debug;
use tracing::info;

use super::NicknameSession;
use crate::IdentityPolicy;
use crate::Result;
use crate::SubmissionSink;
use crate::SyncConfig;
use crate::Transport;

/// Live sessions keyed by a host-chosen name.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<NicknameSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session under `name`. A session already registered under the
    /// same name is closed and replaced.
    pub async fn open(
        &self,
        name: &str,
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn SubmissionSink>,
        policy: Arc<dyn IdentityPolicy>,
    ) -> Result<Arc<NicknameSession>> {
        let session = Arc::new(NicknameSession::start(config, transport, sink, policy)?);

        if let Some(previous) = self.sessions.insert(name.to_string(), session.clone()) {
            debug!(name, previous = previous.id(), "replacing session");
            previous.close().await;
        }
        info!(name, session = session.id(), "session registered");
        Ok(session)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Arc<NicknameSession>> {
        self.sessions.get(name).map(|entry| entry.value().clone())
    }

    /// Closes and forgets the session registered under `name`. Returns false
    /// when there was none.
    pub async fn close(
        &self,
        name: &str,
    ) -> bool {
        let Some((_, session)) = self.sessions.remove(name) else {
            return false;
        };
        session.close().await;
        true
    }

    /// Closes every session concurrently.
    pub async fn close_all(&self) {
        let names: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        let sessions: Vec<Arc<NicknameSession>> = names
            .iter()
            .filter_map(|name| self.sessions.remove(name).map(|(_, session)| session))
            .collect();

        join_all(sessions.iter().map(|session| session.close())).await;
        info!(count = sessions.len(), "all sessions closed");
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
