use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::JobId;
use super::ResultCode;
use super::Transport;
use super::WriteConfirmation;
use crate::IdentityKey;
use crate::Result;
use crate::TransportConfig;
use crate::TransportError;

/// Requests handed to the host session for encoding and sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Ask for fresh profile data for one identity
    Inquiry { key: IdentityKey },
    /// Set (or clear, when empty) the nickname for one identity
    SetNickname {
        job_id: JobId,
        key: IdentityKey,
        nickname: String,
    },
}

/// Transport that queues outbound requests on a bounded channel and pairs
/// write confirmations with their job ids.
///
/// The host drains the receiver returned by [`ChannelTransport::new`] onto the
/// wire and routes `WriteConfirmed` events back through
/// [`Transport::complete_write`].
pub struct ChannelTransport {
    outbound: mpsc::Sender<OutboundMessage>,
    jobs: DashMap<JobId, oneshot::Sender<ResultCode>>,
    next_job_id: AtomicU64,
    write_timeout: Duration,
}

impl ChannelTransport {
    pub fn new(config: &TransportConfig) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (outbound, receiver) = mpsc::channel(config.outbound_buffer);
        trace!(
            outbound_buffer = config.outbound_buffer,
            write_timeout_ms = config.write_timeout_ms,
            "Creating ChannelTransport"
        );

        (
            Self {
                outbound,
                jobs: DashMap::new(),
                next_job_id: AtomicU64::new(1),
                write_timeout: Duration::from_millis(config.write_timeout_ms),
            },
            receiver,
        )
    }

    /// Writes still waiting on a confirmation.
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.next_job_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_inquiry(
        &self,
        key: IdentityKey,
    ) -> Result<()> {
        match self.outbound.try_send(OutboundMessage::Inquiry { key }) {
            Ok(()) => {
                trace!(%key, "inquiry queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                // the resolver still waits out its bound and re-reads the cache
                warn!(%key, "outbound queue full, inquiry dropped");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(TransportError::ChannelClosed.into()),
        }
    }

    async fn send_nickname_write(
        &self,
        key: IdentityKey,
        nickname: String,
    ) -> Result<WriteConfirmation> {
        let job_id = self.next_job_id();
        let (tx, rx) = oneshot::channel();
        self.jobs.insert(job_id, tx);
        let _job = PendingJob {
            jobs: &self.jobs,
            job_id,
        };

        let exchange = async {
            let message = OutboundMessage::SetNickname { job_id, key, nickname };
            if self.outbound.send(message).await.is_err() {
                return Err(TransportError::ChannelClosed);
            }
            debug!(%job_id, %key, "nickname write queued");

            rx.await.map_err(|_| TransportError::ConfirmationDropped { job_id })
        };

        match tokio::time::timeout(self.write_timeout, exchange).await {
            Ok(Ok(result)) => Ok(WriteConfirmation { job_id, result }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                warn!(%job_id, %key, "nickname write not confirmed in time");
                Err(TransportError::Timeout {
                    job_id,
                    duration: self.write_timeout,
                }
                .into())
            }
        }
    }

    fn complete_write(
        &self,
        confirmation: WriteConfirmation,
    ) -> bool {
        let Some((_, waiter)) = self.jobs.remove(&confirmation.job_id) else {
            warn!(job_id = %confirmation.job_id, "confirmation for unknown or expired job");
            return false;
        };

        if waiter.send(confirmation.result).is_err() {
            warn!(job_id = %confirmation.job_id, "write caller dropped before confirmation");
            return false;
        }
        true
    }
}

impl std::fmt::Debug for ChannelTransport {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("pending_jobs", &self.jobs.len())
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Forgets a write job when its caller returns or is dropped. Removal is a
/// no-op once `complete_write` took the job.
struct PendingJob<'a> {
    jobs: &'a DashMap<JobId, oneshot::Sender<ResultCode>>,
    job_id: JobId,
}

impl Drop for PendingJob<'_> {
    fn drop(&mut self) {
        if self.jobs.remove(&self.job_id).is_some() {
            trace!(job_id = %self.job_id, "pending write job released");
        }
    }
}
