//! Destination for exported nickname batches.


use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

use crate::DeliveryError;
use crate::NicknameRecord;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionSink: Send + Sync + 'static {
    /// Delivers one flushed batch. Called at most once per flush cycle; a
    /// failed batch is not offered again.
    ///
    /// # Errors
    /// - [`crate::DeliveryError`] when the sink refuses or cannot be reached
    async fn submit(
        &self,
        batch: Vec<NicknameRecord>,
    ) -> Result<()>;
}

/// Writes each batch as a JSON array to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl LoggingSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubmissionSink for LoggingSink {
    async fn submit(
        &self,
        batch: Vec<NicknameRecord>,
    ) -> Result<()> {
        let payload = serde_json::to_string(&batch).map_err(DeliveryError::from)?;
        info!(size = batch.len(), "nickname export: {}", payload);
        Ok(())
    }
}
