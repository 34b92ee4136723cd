//! Cache-aware nickname writes.
//!
//! A write whose value already matches the cache (absent counts as empty)
//! succeeds without network activity. Otherwise the store is only updated
//! after the remote side confirms with a success code.


use std::sync::Arc;

use tracing::debug;
use tracing::error;
use tracing::instrument;

use crate::metrics::NICKNAME_WRITES;
use crate::IdentityKey;
use crate::IdentityPolicy;
use crate::NicknameStore;
use crate::Result;
use crate::Transport;
use crate::ValidationError;
use crate::WriteError;

pub struct NicknameMutator {
    store: Arc<NicknameStore>,
    transport: Arc<dyn Transport>,
    policy: Arc<dyn IdentityPolicy>,
}

impl NicknameMutator {
    pub fn new(
        store: Arc<NicknameStore>,
        transport: Arc<dyn Transport>,
        policy: Arc<dyn IdentityPolicy>,
    ) -> Self {
        Self {
            store,
            transport,
            policy,
        }
    }

    /// Sets the nickname for `key`; an empty `nickname` clears it.
    ///
    /// # Errors
    /// - [`crate::ValidationError::NotEligible`] before any network activity
    /// - [`crate::WriteError::Rejected`] when the confirmation carries a
    ///   non-success code; the cache is left unchanged
    /// - [`crate::TransportError`] when the write or its confirmation is lost
    #[instrument(skip(self, nickname), fields(key = %key))]
    pub async fn set_nickname(
        &self,
        key: IdentityKey,
        nickname: &str,
    ) -> Result<()> {
        if !self.policy.is_eligible(&key) {
            return Err(ValidationError::NotEligible {
                key,
                account_type: key.account_type(),
            }
            .into());
        }

        let cached = self.store.lookup(&key).unwrap_or_default();
        if cached == nickname {
            NICKNAME_WRITES.with_label_values(&["skipped"]).inc();
            debug!("nickname unchanged, write skipped");
            return Ok(());
        }

        let confirmation = self.transport.send_nickname_write(key, nickname.to_string()).await?;
        if !confirmation.result.is_success() {
            NICKNAME_WRITES.with_label_values(&["rejected"]).inc();
            error!("Failed to set nickname: {}", confirmation.result);
            return Err(WriteError::Rejected {
                key,
                result: confirmation.result,
            }
            .into());
        }

        NICKNAME_WRITES.with_label_values(&["confirmed"]).inc();
        self.store.apply_point_change(key, nickname, true);
        debug!(job_id = %confirmation.job_id, "nickname write confirmed");
        Ok(())
    }
}
