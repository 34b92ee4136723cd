//! Drives a full `NicknameSession` over a `ChannelTransport` against a
//! simulated remote service.
//!
//! Scenario:
//!
//! 1. Resolve a key the remote knows: the inquiry answer wakes the resolver
//!    before the inquiry timeout.
//! 2. Resolve a key the remote has no nickname for: a presence push wakes
//!    the resolver, the answer is absent.
//! 3. Set a nickname twice: one write reaches the remote, the cache follows
//!    the confirmation.
//! 4. Set a nickname the remote refuses: the caller gets the result code,
//!    the cache keeps the previous value.
//! 5. Close the session: learned nicknames are exported in one batch.

mod common;

use std::sync::Arc;

use common::spawn_remote;
use common::CollectingSink;
use common::RemoteState;
use common::FORBIDDEN_NICKNAME;
use nick_sync::ChannelTransport;
use nick_sync::Error;
use nick_sync::IdentityKey;
use nick_sync::IndividualOnly;
use nick_sync::NicknameRecord;
use nick_sync::NicknameSession;
use nick_sync::ResultCode;
use nick_sync::SyncConfig;
use nick_sync::WriteError;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_session_round_trip_scenario() -> Result<(), Error> {
    let known = IdentityKey::individual(1);
    let unknown = IdentityKey::individual(2);
    let own = IdentityKey::individual(3);

    let config = SyncConfig::default();
    let inquiry_timeout = config.resolver.inquiry_timeout();
    let (transport, outbound) = ChannelTransport::new(&config.transport);
    let transport = Arc::new(transport);
    let sink = Arc::new(CollectingSink::default());
    let session = Arc::new(NicknameSession::start(
        config,
        transport.clone(),
        sink.clone(),
        Arc::new(IndividualOnly),
    )?);
    let remote = Arc::new(RemoteState::default().with_nickname(known, "zed"));
    let remote_task = spawn_remote(session.clone(), remote.clone(), outbound);

    // 1. known key
    let start = Instant::now();
    assert_eq!(session.resolve(known).await?, Some("zed".to_string()));
    assert!(start.elapsed() < inquiry_timeout);
    // cached now, no second inquiry
    assert_eq!(session.resolve(known).await?, Some("zed".to_string()));
    assert_eq!(remote.inquiries.lock().as_slice(), &[known]);

    // 2. unknown key
    let start = Instant::now();
    assert_eq!(session.resolve(unknown).await?, None);
    assert!(start.elapsed() < inquiry_timeout);
    assert!(session.correlator().pending_keys().is_empty());

    // 3. idempotent write
    session.set_nickname(own, "neo").await?;
    session.set_nickname(own, "neo").await?;
    assert_eq!(remote.writes.lock().len(), 1);
    assert_eq!(session.store().lookup(&own), Some("neo".to_string()));
    assert_eq!(transport.pending_jobs(), 0);

    // 4. refused write
    match session.set_nickname(own, FORBIDDEN_NICKNAME).await {
        Err(Error::Write(WriteError::Rejected { result, .. })) => {
            assert_eq!(result, ResultCode::AccessDenied);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(session.store().lookup(&own), Some("neo".to_string()));

    assert_eq!(
        session.list_cached_entries(),
        vec![NicknameRecord::new(known, "zed"), NicknameRecord::new(own, "neo")]
    );

    // 5. close
    session.close().await;
    assert_eq!(
        sink.batches(),
        vec![vec![NicknameRecord::new(known, "zed"), NicknameRecord::new(own, "neo")]]
    );
    assert!(session.list_cached_entries().is_empty());

    remote_task.abort();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ineligible_identity_never_reaches_remote() -> Result<(), Error> {
    let clan = IdentityKey::new(103582791429521408);
    let config = SyncConfig::default();
    let (transport, outbound) = ChannelTransport::new(&config.transport);
    let session = Arc::new(NicknameSession::start(
        config,
        Arc::new(transport),
        Arc::new(CollectingSink::default()),
        Arc::new(IndividualOnly),
    )?);
    let remote = Arc::new(RemoteState::default());
    let remote_task = spawn_remote(session.clone(), remote.clone(), outbound);

    let error = session.resolve(clan).await.unwrap_err();
    assert_eq!(error.reason(), "account type Clan isn't Individual");
    let error = session.set_nickname(clan, "group").await.unwrap_err();
    assert!(matches!(error, Error::Validation(_)));

    assert!(remote.inquiries.lock().is_empty());
    assert!(remote.writes.lock().is_empty());

    session.close().await;
    remote_task.abort();
    Ok(())
}
