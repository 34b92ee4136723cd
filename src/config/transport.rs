use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_OUTBOUND_BUFFER;
use crate::constants::DEFAULT_WRITE_TIMEOUT_MS;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransportConfig {
    /// Upper bound on waiting for a write confirmation (milliseconds)
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Capacity of the outbound request queue
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_write_timeout_ms(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl TransportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.write_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "transport.write_timeout_ms cannot be 0".into(),
            )));
        }

        if self.outbound_buffer == 0 {
            return Err(Error::Config(ConfigError::Message(
                "transport.outbound_buffer must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

fn default_outbound_buffer() -> usize {
    DEFAULT_OUTBOUND_BUFFER
}
