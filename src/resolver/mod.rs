//! Cache-first nickname reads backed by an out-of-band inquiry.
//!
//! A hit returns without suspending. A miss registers a waiter, sends one
//! inquiry, waits at most the configured bound and reads the cache again,
//! whatever the wait outcome was. A late update still lands in the store for
//! the next call.

#[cfg(test)]
mod resolver_test;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::instrument;
use tracing::warn;

use crate::metrics::CACHE_LOOKUPS;
use crate::metrics::INQUIRY_OUTCOMES;
use crate::IdentityKey;
use crate::IdentityPolicy;
use crate::NicknameStore;
use crate::RequestCorrelator;
use crate::Result;
use crate::Transport;
use crate::ValidationError;
use crate::WaitOutcome;

pub struct NameResolver {
    store: Arc<NicknameStore>,
    correlator: Arc<RequestCorrelator>,
    transport: Arc<dyn Transport>,
    policy: Arc<dyn IdentityPolicy>,
    inquiry_timeout: Duration,
}

impl NameResolver {
    pub fn new(
        store: Arc<NicknameStore>,
        correlator: Arc<RequestCorrelator>,
        transport: Arc<dyn Transport>,
        policy: Arc<dyn IdentityPolicy>,
        inquiry_timeout: Duration,
    ) -> Self {
        Self {
            store,
            correlator,
            transport,
            policy,
            inquiry_timeout,
        }
    }

    /// Returns the cached nickname for `key`, asking the remote side on a miss.
    ///
    /// # Returns
    /// - `Ok(Some(name))` when a nickname is cached, before or after the wait
    /// - `Ok(None)` when still unknown after the wait (including timeout)
    ///
    /// # Errors
    /// - [`crate::ValidationError::NotEligible`] for a miss on an ineligible key,
    ///   raised before any network activity
    /// - [`crate::TransportError`] when the inquiry cannot be queued
    #[instrument(skip(self), fields(key = %key))]
    pub async fn resolve(
        &self,
        key: IdentityKey,
    ) -> Result<Option<String>> {
        if let Some(nickname) = self.store.lookup(&key) {
            CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            debug!("cache hit");
            return Ok(Some(nickname));
        }
        CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        if !self.policy.is_eligible(&key) {
            return Err(ValidationError::NotEligible {
                key,
                account_type: key.account_type(),
            }
            .into());
        }

        let handle = self.correlator.register_waiter(key);
        if let Err(e) = self.transport.send_inquiry(key).await {
            self.correlator.cancel(handle);
            return Err(e);
        }

        match self.correlator.wait(handle, self.inquiry_timeout).await {
            WaitOutcome::Resolved => {
                INQUIRY_OUTCOMES.with_label_values(&["resolved"]).inc();
                debug!("inquiry resolved");
            }
            WaitOutcome::TimedOut => {
                INQUIRY_OUTCOMES.with_label_values(&["timed_out"]).inc();
                warn!(timeout = ?self.inquiry_timeout, "inquiry timed out, answering from cache");
            }
        }

        Ok(self.store.lookup(&key))
    }
}
