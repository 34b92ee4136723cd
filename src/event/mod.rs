//! Inbound events pushed by the remote session.


#[cfg(test)]
use mockall::automock;

use crate::IdentityKey;
use crate::NicknameList;
use crate::WriteConfirmation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Bulk listing, initial or incremental
    NicknameList(NicknameList),

    /// Single nickname change. `is_echo` marks the echo of our own write.
    NicknameChanged {
        key: IdentityKey,
        nickname: String,
        is_echo: bool,
    },

    /// Result of a nickname write issued by this session
    WriteConfirmed(WriteConfirmation),

    /// Presence push carrying no nickname
    PresenceUpdated { key: IdentityKey },
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::NicknameList(_) => "nickname_list",
            InboundEvent::NicknameChanged { .. } => "nickname_changed",
            InboundEvent::WriteConfirmed(_) => "write_confirmed",
            InboundEvent::PresenceUpdated { .. } => "presence_updated",
        }
    }
}

/// One method per [`InboundEvent`] variant.
#[cfg_attr(test, automock)]
pub trait EventHandler: Send + Sync {
    fn on_nickname_list(
        &self,
        list: NicknameList,
    );

    fn on_nickname_changed(
        &self,
        key: IdentityKey,
        nickname: String,
        is_echo: bool,
    );

    fn on_write_confirmed(
        &self,
        confirmation: WriteConfirmation,
    );

    fn on_presence_updated(
        &self,
        key: IdentityKey,
    );
}

/// Routes `event` to the matching handler method.
pub fn dispatch<H>(
    handler: &H,
    event: InboundEvent,
) where
    H: EventHandler + ?Sized,
{
    match event {
        InboundEvent::NicknameList(list) => handler.on_nickname_list(list),
        InboundEvent::NicknameChanged {
            key,
            nickname,
            is_echo,
        } => handler.on_nickname_changed(key, nickname, is_echo),
        InboundEvent::WriteConfirmed(confirmation) => handler.on_write_confirmed(confirmation),
        InboundEvent::PresenceUpdated { key } => handler.on_presence_updated(key),
    }
}
