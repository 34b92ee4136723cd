use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_INQUIRY_TIMEOUT_MS;
use crate::Error;
use crate::Result;

const MAX_INQUIRY_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResolverConfig {
    /// How long a cache miss waits for resolving evidence before the cache is
    /// read again. Best-effort bound, not a correctness gate.
    ///
    /// Range: 1-60000
    /// Default: 3000
    #[serde(default = "default_inquiry_timeout_ms")]
    pub inquiry_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            inquiry_timeout_ms: default_inquiry_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn inquiry_timeout(&self) -> Duration {
        Duration::from_millis(self.inquiry_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.inquiry_timeout_ms == 0 || self.inquiry_timeout_ms > MAX_INQUIRY_TIMEOUT_MS {
            return Err(Error::Config(ConfigError::Message(format!(
                "resolver.inquiry_timeout_ms must be between 1 and {MAX_INQUIRY_TIMEOUT_MS}, got {}",
                self.inquiry_timeout_ms
            ))));
        }
        Ok(())
    }
}

fn default_inquiry_timeout_ms() -> u64 {
    DEFAULT_INQUIRY_TIMEOUT_MS
}
