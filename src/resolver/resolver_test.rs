use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::AllowAll;
use crate::ChannelTransport;
use crate::Error;
use crate::IndividualOnly;
use crate::MockTransport;
use crate::NicknameEntry;
use crate::Transport;
use crate::TransportConfig;
use crate::TransportError;

const INQUIRY_TIMEOUT: Duration = Duration::from_secs(3);

struct TestContext {
    store: Arc<NicknameStore>,
    correlator: Arc<RequestCorrelator>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            store: Arc::new(NicknameStore::new()),
            correlator: Arc::new(RequestCorrelator::new()),
        }
    }

    fn resolver(
        &self,
        transport: MockTransport,
    ) -> NameResolver {
        NameResolver::new(
            self.store.clone(),
            self.correlator.clone(),
            Arc::new(transport),
            Arc::new(IndividualOnly),
            INQUIRY_TIMEOUT,
        )
    }
}

fn key(account_id: u32) -> IdentityKey {
    IdentityKey::individual(account_id)
}

fn clan_key() -> IdentityKey {
    IdentityKey::new(103582791429521408)
}

#[tokio::test(start_paused = true)]
async fn cache_hit_returns_immediately_without_network() {
    let context = TestContext::new();
    context.store.apply_point_change(key(1), "alice", true);
    // no expectations: any transport call panics
    let resolver = context.resolver(MockTransport::new());

    let start = Instant::now();
    let result = resolver.resolve(key(1)).await.unwrap();

    assert_eq!(result, Some("alice".to_string()));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn ineligible_key_miss_is_rejected_before_network() {
    let context = TestContext::new();
    let resolver = context.resolver(MockTransport::new());

    let result = resolver.resolve(clan_key()).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(context.correlator.pending_keys().is_empty());
}

#[tokio::test]
async fn cached_value_wins_over_eligibility_check() {
    let context = TestContext::new();
    context.store.apply_snapshot(&[NicknameEntry::new(clan_key(), "group")]);
    let resolver = context.resolver(MockTransport::new());

    assert_eq!(resolver.resolve(clan_key()).await.unwrap(), Some("group".to_string()));
}

#[tokio::test(start_paused = true)]
async fn miss_without_update_times_out_to_absent() {
    let context = TestContext::new();
    let mut transport = MockTransport::new();
    transport.expect_send_inquiry().times(1).returning(|_| Ok(()));
    let resolver = context.resolver(transport);

    let start = Instant::now();
    let result = resolver.resolve(key(2)).await.unwrap();

    assert_eq!(result, None);
    assert!(start.elapsed() >= INQUIRY_TIMEOUT);
    assert!(context.correlator.pending_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn update_applied_without_signal_is_seen_after_timeout() {
    let context = TestContext::new();
    let store = context.store.clone();
    let mut transport = MockTransport::new();
    transport.expect_send_inquiry().times(1).returning(move |key| {
        // update lands in the store but nobody signals the correlator
        store.apply_point_change(key, "late", false);
        Ok(())
    });
    let resolver = context.resolver(transport);

    let start = Instant::now();
    let result = resolver.resolve(key(3)).await.unwrap();

    assert_eq!(result, Some("late".to_string()));
    assert!(start.elapsed() >= INQUIRY_TIMEOUT);
}

#[tokio::test(start_paused = true)]
async fn signaled_update_resolves_before_timeout() {
    let context = TestContext::new();
    let store = context.store.clone();
    let correlator = context.correlator.clone();
    let mut transport = MockTransport::new();
    transport.expect_send_inquiry().times(1).returning(move |key| {
        store.apply_point_change(key, "bob", false);
        correlator.signal(&key);
        Ok(())
    });
    let resolver = context.resolver(transport);

    let start = Instant::now();
    let result = resolver.resolve(key(4)).await.unwrap();

    assert_eq!(result, Some("bob".to_string()));
    assert!(start.elapsed() < INQUIRY_TIMEOUT);
}

#[tokio::test]
async fn inquiry_send_failure_is_surfaced_and_waiter_withdrawn() {
    let context = TestContext::new();
    let mut transport = MockTransport::new();
    transport
        .expect_send_inquiry()
        .times(1)
        .returning(|_| Err(TransportError::ChannelClosed.into()));
    let resolver = context.resolver(transport);

    let result = resolver.resolve(key(5)).await;

    assert!(matches!(result, Err(Error::Transport(TransportError::ChannelClosed))));
    assert_eq!(context.correlator.pending_count(&key(5)), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_both_observe_the_update() {
    let context = TestContext::new();
    let mut transport = MockTransport::new();
    transport.expect_send_inquiry().times(2).returning(|_| Ok(()));
    let resolver = Arc::new(NameResolver::new(
        context.store.clone(),
        context.correlator.clone(),
        Arc::new(transport),
        Arc::new(AllowAll),
        Duration::from_secs(10),
    ));

    let first = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(key(6)).await }
    });
    let second = tokio::spawn({
        let resolver = resolver.clone();
        async move { resolver.resolve(key(6)).await }
    });

    while context.correlator.pending_count(&key(6)) < 2 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    context.store.apply_point_change(key(6), "carol", false);
    assert_eq!(context.correlator.signal(&key(6)), 2);

    assert_eq!(first.await.unwrap().unwrap(), Some("carol".to_string()));
    assert_eq!(second.await.unwrap().unwrap(), Some("carol".to_string()));
}

#[tokio::test(start_paused = true)]
async fn stalled_outbound_queue_still_honors_inquiry_bound() {
    let context = TestContext::new();
    let (transport, _outbound) = ChannelTransport::new(&TransportConfig {
        write_timeout_ms: 10_000,
        outbound_buffer: 8,
    });
    for account_id in 100..108 {
        transport.send_inquiry(key(account_id)).await.unwrap();
    }
    let resolver = NameResolver::new(
        context.store.clone(),
        context.correlator.clone(),
        Arc::new(transport),
        Arc::new(IndividualOnly),
        INQUIRY_TIMEOUT,
    );

    let start = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(60), resolver.resolve(key(1))).await;

    assert_eq!(result.unwrap().unwrap(), None);
    assert!(start.elapsed() >= INQUIRY_TIMEOUT);
    assert!(start.elapsed() < Duration::from_secs(60));
    assert!(context.correlator.pending_keys().is_empty());
}
