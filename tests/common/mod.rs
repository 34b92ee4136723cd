use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nick_sync::IdentityKey;
use nick_sync::InboundEvent;
use nick_sync::NicknameRecord;
use nick_sync::NicknameSession;
use nick_sync::OutboundMessage;
use nick_sync::ResultCode;
use nick_sync::SubmissionSink;
use nick_sync::WriteConfirmation;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Nickname the simulated remote refuses to store.
pub const FORBIDDEN_NICKNAME: &str = "forbidden";

/// Delay before the simulated remote answers an inquiry.
pub const INQUIRY_LATENCY: Duration = Duration::from_millis(50);

/// Remote-side nickname table, keyed by identity.
#[derive(Debug, Default)]
pub struct RemoteState {
    pub nicknames: Mutex<Vec<(IdentityKey, String)>>,
    pub inquiries: Mutex<Vec<IdentityKey>>,
    pub writes: Mutex<Vec<(IdentityKey, String)>>,
}

impl RemoteState {
    pub fn with_nickname(
        self,
        key: IdentityKey,
        nickname: &str,
    ) -> Self {
        self.nicknames.lock().push((key, nickname.to_string()));
        self
    }

    fn nickname(
        &self,
        key: IdentityKey,
    ) -> Option<String> {
        self.nicknames
            .lock()
            .iter()
            .find(|(known, _)| *known == key)
            .map(|(_, nickname)| nickname.clone())
    }
}

/// Answers outbound messages the way the remote service would: inquiries
/// with a nickname change (or a bare presence push when none is known) and
/// writes with a confirmation followed by the echo.
pub fn spawn_remote(
    session: Arc<NicknameSession>,
    state: Arc<RemoteState>,
    mut outbound: mpsc::Receiver<OutboundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            match message {
                OutboundMessage::Inquiry { key } => {
                    state.inquiries.lock().push(key);
                    tokio::time::sleep(INQUIRY_LATENCY).await;
                    let event = match state.nickname(key) {
                        Some(nickname) => InboundEvent::NicknameChanged {
                            key,
                            nickname,
                            is_echo: false,
                        },
                        None => InboundEvent::PresenceUpdated { key },
                    };
                    session.handle_event(event);
                }
                OutboundMessage::SetNickname { job_id, key, nickname } => {
                    state.writes.lock().push((key, nickname.clone()));
                    let result = if nickname == FORBIDDEN_NICKNAME {
                        ResultCode::AccessDenied
                    } else {
                        ResultCode::Ok
                    };
                    session.handle_event(InboundEvent::WriteConfirmed(WriteConfirmation { job_id, result }));
                    if result.is_success() {
                        session.handle_event(InboundEvent::NicknameChanged {
                            key,
                            nickname,
                            is_echo: true,
                        });
                    }
                }
            }
        }
    })
}

#[derive(Debug, Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Vec<NicknameRecord>>>,
}

impl CollectingSink {
    pub fn batches(&self) -> Vec<Vec<NicknameRecord>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl SubmissionSink for CollectingSink {
    async fn submit(
        &self,
        batch: Vec<NicknameRecord>,
    ) -> nick_sync::Result<()> {
        self.batches.lock().push(batch);
        Ok(())
    }
}
