//! Per-session nickname context.
//!
//! A [`NicknameSession`] owns every piece of nickname state for one remote
//! session: cache, pending inquiries, export queue. Closing it (or dropping it)
//! releases all of that state; nothing is kept in process-wide maps.

mod registry;
pub use registry::*;


use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::instrument;

use crate::dispatch;
use crate::metrics::register_custom_metrics;
use crate::Error;
use crate::EventHandler;
use crate::FlushFailure;
use crate::IdentityKey;
use crate::IdentityPolicy;
use crate::InboundEvent;
use crate::NameResolver;
use crate::NicknameList;
use crate::NicknameMutator;
use crate::NicknameRecord;
use crate::NicknameStore;
use crate::RequestCorrelator;
use crate::Result;
use crate::SubmissionBatcher;
use crate::SubmissionSink;
use crate::SyncConfig;
use crate::Transport;
use crate::WriteConfirmation;

const SESSION_ID_LEN: usize = 12;

pub struct NicknameSession {
    id: String,
    store: Arc<NicknameStore>,
    correlator: Arc<RequestCorrelator>,
    transport: Arc<dyn Transport>,
    resolver: NameResolver,
    mutator: NicknameMutator,
    batcher: SubmissionBatcher,
    closed: CancellationToken,
}

impl NicknameSession {
    /// Validates `config` and wires a new session. Must be called inside a
    /// tokio runtime; the export flush loop is spawned here.
    pub fn start(
        config: SyncConfig,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn SubmissionSink>,
        policy: Arc<dyn IdentityPolicy>,
    ) -> Result<Self> {
        let config = config.validate()?;
        register_custom_metrics();

        let store = Arc::new(NicknameStore::new());
        let correlator = Arc::new(RequestCorrelator::new());
        let resolver = NameResolver::new(
            store.clone(),
            correlator.clone(),
            transport.clone(),
            policy.clone(),
            config.resolver.inquiry_timeout(),
        );
        let mutator = NicknameMutator::new(store.clone(), transport.clone(), policy);
        let batcher = SubmissionBatcher::start(sink, &config.batcher);

        let id = nanoid::nanoid!(SESSION_ID_LEN);
        info!(session = %id, "nickname session started");

        Ok(Self {
            id,
            store,
            correlator,
            transport,
            resolver,
            mutator,
            batcher,
            closed: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// See [`NameResolver::resolve`].
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn resolve(
        &self,
        key: IdentityKey,
    ) -> Result<Option<String>> {
        self.ensure_open()?;
        self.resolver.resolve(key).await
    }

    /// See [`NicknameMutator::set_nickname`].
    #[instrument(skip(self, nickname), fields(session = %self.id))]
    pub async fn set_nickname(
        &self,
        key: IdentityKey,
        nickname: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        self.mutator.set_nickname(key, nickname).await
    }

    /// Current cache contents, sorted by key.
    pub fn list_cached_entries(&self) -> Vec<NicknameRecord> {
        self.store.entries()
    }

    pub fn enqueue_for_export(
        &self,
        key: IdentityKey,
        nickname: impl Into<String>,
    ) {
        self.batcher.enqueue(key, nickname);
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<FlushFailure> {
        self.batcher.subscribe_failures()
    }

    /// Applies one inbound event. Events arriving after `close` are ignored.
    #[instrument(skip(self, event), fields(session = %self.id, event = event.name()))]
    pub fn handle_event(
        &self,
        event: InboundEvent,
    ) {
        if self.is_closed() {
            debug!("session closed, event ignored");
            return;
        }
        dispatch(self, event);
    }

    /// Flushes the export queue, ends pending waits and drops the cache.
    /// Later calls are no-ops.
    pub async fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();

        self.batcher.shutdown().await;
        self.correlator.clear();
        self.store.clear();
        info!(session = %self.id, "nickname session closed");
    }

    pub fn store(&self) -> &Arc<NicknameStore> {
        &self.store
    }

    pub fn correlator(&self) -> &Arc<RequestCorrelator> {
        &self.correlator
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed(self.id.clone()));
        }
        Ok(())
    }

    fn learned(
        &self,
        key: IdentityKey,
        nickname: &str,
    ) {
        self.correlator.signal(&key);
        if !nickname.is_empty() {
            self.batcher.enqueue(key, nickname);
        }
    }
}

impl EventHandler for NicknameSession {
    fn on_nickname_list(
        &self,
        list: NicknameList,
    ) {
        self.store.apply_list(&list);
        for entry in &list.entries {
            let nickname = if list.removal { "" } else { entry.nickname.as_str() };
            self.learned(entry.key, nickname);
        }
    }

    fn on_nickname_changed(
        &self,
        key: IdentityKey,
        nickname: String,
        is_echo: bool,
    ) {
        self.store.apply_point_change(key, &nickname, is_echo);
        self.learned(key, &nickname);
    }

    fn on_write_confirmed(
        &self,
        confirmation: WriteConfirmation,
    ) {
        if !self.transport.complete_write(confirmation) {
            debug!(job_id = %confirmation.job_id, "confirmation matched no pending write");
        }
    }

    fn on_presence_updated(
        &self,
        key: IdentityKey,
    ) {
        self.correlator.signal(&key);
    }
}

impl std::fmt::Debug for NicknameSession {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("NicknameSession")
            .field("id", &self.id)
            .field("cached", &self.store.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
