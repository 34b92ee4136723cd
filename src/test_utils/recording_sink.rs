use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::DeliveryError;
use crate::NicknameRecord;
use crate::Result;
use crate::SubmissionSink;

/// Sink that keeps every delivered batch. The first `failures` submissions
/// are refused instead.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<Vec<NicknameRecord>>>,
    failures: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: usize) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn batches(&self) -> Vec<Vec<NicknameRecord>> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(
        &self,
        batch: Vec<NicknameRecord>,
    ) -> Result<()> {
        let refuse = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(DeliveryError::Unreachable("sink offline".into()).into());
        }

        self.batches.lock().push(batch);
        Ok(())
    }
}
