//! Nickname Synchronization Error Hierarchy
//!
//! Errors are grouped by the layer that raises them. Inquiry timeouts are not
//! errors: the resolver absorbs them and answers from the cache.

use std::time::Duration;

use config::ConfigError;

use crate::AccountType;
use crate::IdentityKey;
use crate::JobId;
use crate::ResultCode;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Identity is not eligible for nickname operations
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Remote side refused a nickname write
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Outbound transport could not carry a request or its reply
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Export sink refused or could not receive a batch
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Operation issued against a session after `close`
    #[error("Session {0} is closed")]
    SessionClosed(String),
}

impl Error {
    /// Human-readable reason suitable for an operator-facing reply.
    pub fn reason(&self) -> String {
        match self {
            Error::Write(WriteError::Rejected { result, .. }) => result.to_string(),
            Error::Validation(ValidationError::NotEligible { account_type, .. }) => {
                format!("account type {account_type:?} isn't Individual")
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Identity {key} ({account_type:?}) is not eligible for nickname operations")]
    NotEligible {
        key: IdentityKey,
        account_type: AccountType,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Non-success result code in the write confirmation
    #[error("Failed to set nickname for {key}: {result}")]
    Rejected { key: IdentityKey, result: ResultCode },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Outbound queue receiver is gone (session pump stopped)
    #[error("Outbound channel closed")]
    ChannelClosed,

    /// No confirmation arrived within the transport's own bound
    #[error("Write job {job_id} not confirmed after {duration:?}")]
    Timeout { job_id: JobId, duration: Duration },

    /// Pending job was discarded before its confirmation arrived
    #[error("Write job {job_id} confirmation dropped")]
    ConfirmationDropped { job_id: JobId },

    #[error("Failed to send request: {0}")]
    SendFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Sink rejected batch: {0}")]
    Rejected(String),

    #[error("Sink unreachable: {0}")]
    Unreachable(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
