//! Debounced export of learned nicknames.
//!
//! `enqueue` records the latest value per key and, if no flush is scheduled,
//! arms one for `quiet_period` from now. A single background loop per batcher
//! owns the timer: it drains the queue and resets the scheduled flag under one
//! lock, then delivers the batch once. Values enqueued after the drain start a
//! new cycle. Failed deliveries are not retried.


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::trace;
use tracing::warn;

use crate::metrics::BATCH_FLUSHES;
use crate::metrics::BATCH_SIZE;
use crate::BatcherConfig;
use crate::IdentityKey;
use crate::NicknameRecord;
use crate::SubmissionSink;

/// Reported to [`SubmissionBatcher::subscribe_failures`] subscribers when a
/// batch could not be delivered. The batch itself is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    pub batch_size: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
struct BatchState {
    queued: HashMap<IdentityKey, String>,
    flush_scheduled: bool,
    deadline: Option<Instant>,
    /// Set by the final drain; later values are refused
    stopped: bool,
}

struct BatcherInner {
    /// `queued`, `flush_scheduled` and `stopped` only change under this lock
    state: Mutex<BatchState>,
    wake: Notify,
    shutdown: CancellationToken,
    sink: Arc<dyn SubmissionSink>,
    quiet_period: Duration,
    failures: broadcast::Sender<FlushFailure>,
}

pub struct SubmissionBatcher {
    inner: Arc<BatcherInner>,
    flush_loop: Mutex<Option<JoinHandle<()>>>,
}

impl SubmissionBatcher {
    /// Spawns the flush loop on the current runtime.
    pub fn start(
        sink: Arc<dyn SubmissionSink>,
        config: &BatcherConfig,
    ) -> Self {
        let (failures, _) = broadcast::channel(config.failure_channel_capacity);
        let inner = Arc::new(BatcherInner {
            state: Mutex::new(BatchState::default()),
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
            sink,
            quiet_period: config.quiet_period(),
            failures,
        });

        let handle = tokio::spawn(Self::run(inner.clone()));

        Self {
            inner,
            flush_loop: Mutex::new(Some(handle)),
        }
    }

    /// Queues `nickname` for export under `key`, replacing any value queued
    /// earlier in the same cycle. Never waits on the sink.
    pub fn enqueue(
        &self,
        key: IdentityKey,
        nickname: impl Into<String>,
    ) {
        let arm = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                warn!(%key, "batcher stopped, export value dropped");
                return;
            }
            state.queued.insert(key, nickname.into());
            if state.flush_scheduled {
                false
            } else {
                state.flush_scheduled = true;
                state.deadline = Some(Instant::now() + self.inner.quiet_period);
                true
            }
        };

        if arm {
            trace!(%key, "flush scheduled");
            self.inner.wake.notify_one();
        }
    }

    pub fn subscribe_failures(&self) -> broadcast::Receiver<FlushFailure> {
        self.inner.failures.subscribe()
    }

    /// Number of distinct keys waiting for the next flush.
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().queued.len()
    }

    /// Stops the flush loop after delivering whatever is still queued.
    /// Later calls are no-ops.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let handle = self.flush_loop.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Batcher flush loop panicked: {:?}", e);
            }
        }
    }

    async fn run(inner: Arc<BatcherInner>) {
        debug!("batcher flush loop started");
        loop {
            tokio::select! {
                _ = inner.wake.notified() => {}
                _ = inner.shutdown.cancelled() => break,
            }

            let deadline = inner.state.lock().deadline;
            if let Some(deadline) = deadline {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = inner.shutdown.cancelled() => break,
                }
            }

            inner.flush(false).await;
        }

        inner.flush(true).await;
        debug!("batcher flush loop stopped");
    }
}

impl Drop for SubmissionBatcher {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

impl BatcherInner {
    /// Drains and delivers the queue. `last` closes the queue in the same
    /// critical section, so nothing can be queued after the final drain.
    async fn flush(
        &self,
        last: bool,
    ) {
        let queued = {
            let mut state = self.state.lock();
            state.stopped |= last;
            state.flush_scheduled = false;
            state.deadline = None;
            std::mem::take(&mut state.queued)
        };
        if queued.is_empty() {
            return;
        }

        let mut batch: Vec<NicknameRecord> = queued
            .into_iter()
            .map(|(key, name)| NicknameRecord::new(key, name))
            .collect();
        batch.sort_by_key(|record| record.key);

        let batch_size = batch.len();
        BATCH_SIZE.observe(batch_size as f64);

        match self.sink.submit(batch).await {
            Ok(()) => {
                BATCH_FLUSHES.with_label_values(&["delivered"]).inc();
                debug!(batch_size, "nickname batch delivered");
            }
            Err(e) => {
                BATCH_FLUSHES.with_label_values(&["failed"]).inc();
                error!(batch_size, "Failed to deliver nickname batch: {:?}", e);
                // no subscribers is fine
                let _ = self.failures.send(FlushFailure {
                    batch_size,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl std::fmt::Debug for SubmissionBatcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SubmissionBatcher")
            .field("quiet_period", &self.inner.quiet_period)
            .field("pending", &self.pending_len())
            .finish()
    }
}
