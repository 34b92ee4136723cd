use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_FAILURE_CHANNEL_CAPACITY;
use crate::constants::DEFAULT_QUIET_PERIOD_MS;
use crate::Error;
use crate::Result;

const MAX_QUIET_PERIOD_MS: u64 = 600_000;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatcherConfig {
    /// Delay after the first queued name before the batch is flushed. Names
    /// arriving meanwhile join the same batch.
    ///
    /// Range: 1-600000
    /// Default: 3000
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,

    /// Flush failures buffered for slow observers before the oldest are dropped
    #[serde(default = "default_failure_channel_capacity")]
    pub failure_channel_capacity: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            failure_channel_capacity: default_failure_channel_capacity(),
        }
    }
}

impl BatcherConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiet_period_ms == 0 || self.quiet_period_ms > MAX_QUIET_PERIOD_MS {
            return Err(Error::Config(ConfigError::Message(format!(
                "batcher.quiet_period_ms must be between 1 and {MAX_QUIET_PERIOD_MS}, got {}",
                self.quiet_period_ms
            ))));
        }

        if self.failure_channel_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "batcher.failure_channel_capacity must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_quiet_period_ms() -> u64 {
    DEFAULT_QUIET_PERIOD_MS
}

fn default_failure_channel_capacity() -> usize {
    DEFAULT_FAILURE_CHANNEL_CAPACITY
}
