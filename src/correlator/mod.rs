//! Pending inquiry bookkeeping.
//!
//! A waiter is a one-shot sender keyed by identity. `signal` wakes every
//! waiter currently registered for a key and destroys the pending entry.
//! `wait` races the one-shot against a timer; whichever completes first is the
//! outcome, and a waiter is never resolved twice. Signals are keyed by identity
//! only, so any update for the key counts as resolving evidence.


use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::trace;

use crate::IdentityKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Resolved,
    TimedOut,
}

#[derive(Debug)]
struct Waiter {
    id: u64,
    sender: oneshot::Sender<()>,
}

/// Returned by [`RequestCorrelator::register_waiter`]; consumed by
/// [`RequestCorrelator::wait`].
#[derive(Debug)]
pub struct WaitHandle {
    key: IdentityKey,
    id: u64,
    receiver: oneshot::Receiver<()>,
}

impl WaitHandle {
    pub fn key(&self) -> IdentityKey {
        self.key
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct RequestCorrelator {
    pending: DashMap<IdentityKey, Vec<Waiter>>,
    next_id: AtomicU64,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the pending inquiry for `key`, creating it if none exists.
    pub fn register_waiter(
        &self,
        key: IdentityKey,
    ) -> WaitHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();

        let mut waiters = self.pending.entry(key).or_default();
        waiters.push(Waiter { id, sender });
        trace!(%key, waiter_id = id, waiters = waiters.len(), "waiter registered");

        WaitHandle { key, id, receiver }
    }

    /// Wakes every waiter currently registered for `key`. Returns how many
    /// were woken; zero when nobody was waiting.
    pub fn signal(
        &self,
        key: &IdentityKey,
    ) -> usize {
        let Some((_, waiters)) = self.pending.remove(key) else {
            return 0;
        };

        let count = waiters.len();
        for waiter in waiters {
            // receiver gone means the waiter already timed out
            let _ = waiter.sender.send(());
        }
        debug!(key = %key, count, "waiters signaled");
        count
    }

    /// Suspends until `handle` is signaled or `timeout` elapses. Never touches
    /// the cache; callers re-read it afterwards.
    pub async fn wait(
        &self,
        mut handle: WaitHandle,
        timeout: Duration,
    ) -> WaitOutcome {
        match tokio::time::timeout(timeout, &mut handle.receiver).await {
            Ok(Ok(())) => WaitOutcome::Resolved,
            Ok(Err(_)) => {
                // sender dropped by `clear` without a signal
                WaitOutcome::TimedOut
            }
            Err(_) => {
                self.abandon(&handle);
                WaitOutcome::TimedOut
            }
        }
    }

    /// Withdraws a waiter that will never be awaited.
    pub fn cancel(
        &self,
        handle: WaitHandle,
    ) {
        self.abandon(&handle);
    }

    pub fn pending_count(
        &self,
        key: &IdentityKey,
    ) -> usize {
        self.pending.get(key).map(|waiters| waiters.len()).unwrap_or(0)
    }

    pub fn pending_keys(&self) -> Vec<IdentityKey> {
        let mut keys: Vec<IdentityKey> = self.pending.iter().map(|entry| *entry.key()).collect();
        keys.sort();
        keys
    }

    /// Drops every waiter; outstanding waits end as [`WaitOutcome::TimedOut`].
    pub fn clear(&self) {
        self.pending.clear();
    }

    /// Removes a timed-out waiter, destroying the pending entry once empty.
    fn abandon(
        &self,
        handle: &WaitHandle,
    ) {
        self.pending.remove_if_mut(&handle.key, |_, waiters| {
            waiters.retain(|waiter| waiter.id != handle.id);
            waiters.is_empty()
        });
        trace!(key = %handle.key, waiter_id = handle.id, "waiter abandoned");
    }
}
