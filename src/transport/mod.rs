//! Transport abstraction between the nickname core and the remote session.
//!
//! The core never encodes messages itself. It asks the transport to send an
//! inquiry (fire-and-forget, answered out-of-band by any later update for the
//! key) or a nickname write (answered by a confirmation carrying a result code).

mod channel_transport;
pub use channel_transport::*;


use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::IdentityKey;
use crate::Result;

/// Correlates a write request with its confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote result codes relevant to nickname writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Ok,
    Fail,
    NoConnection,
    InvalidParam,
    Busy,
    AccessDenied,
    Timeout,
    InvalidIdentity,
    ServiceUnavailable,
    LimitExceeded,
    RateLimitExceeded,
    Unknown(i32),
}

impl ResultCode {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Ok)
    }

    pub fn code(&self) -> i32 {
        match self {
            ResultCode::Ok => 1,
            ResultCode::Fail => 2,
            ResultCode::NoConnection => 3,
            ResultCode::InvalidParam => 8,
            ResultCode::Busy => 10,
            ResultCode::AccessDenied => 15,
            ResultCode::Timeout => 16,
            ResultCode::InvalidIdentity => 19,
            ResultCode::ServiceUnavailable => 20,
            ResultCode::LimitExceeded => 25,
            ResultCode::RateLimitExceeded => 84,
            ResultCode::Unknown(code) => *code,
        }
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            1 => ResultCode::Ok,
            2 => ResultCode::Fail,
            3 => ResultCode::NoConnection,
            8 => ResultCode::InvalidParam,
            10 => ResultCode::Busy,
            15 => ResultCode::AccessDenied,
            16 => ResultCode::Timeout,
            19 => ResultCode::InvalidIdentity,
            20 => ResultCode::ServiceUnavailable,
            25 => ResultCode::LimitExceeded,
            84 => ResultCode::RateLimitExceeded,
            other => ResultCode::Unknown(other),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ResultCode::Unknown(code) => write!(f, "Unknown({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfirmation {
    pub job_id: JobId,
    pub result: ResultCode,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Requests fresh data for `key`. Returns once the request is queued; the
    /// answer arrives later as an inbound event.
    async fn send_inquiry(
        &self,
        key: IdentityKey,
    ) -> Result<()>;

    /// Sends a nickname write and waits for its confirmation.
    ///
    /// An empty `nickname` clears the nickname remotely. The wait is bounded
    /// by the transport's own timeout.
    ///
    /// # Errors
    /// - [`crate::TransportError::ChannelClosed`] if the request could not be queued
    /// - [`crate::TransportError::Timeout`] if no confirmation arrived in time
    async fn send_nickname_write(
        &self,
        key: IdentityKey,
        nickname: String,
    ) -> Result<WriteConfirmation>;

    /// Routes an inbound confirmation to the write waiting on it. Returns
    /// false if no write was waiting.
    fn complete_write(
        &self,
        _confirmation: WriteConfirmation,
    ) -> bool {
        false
    }
}
