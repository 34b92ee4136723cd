//! Configuration management for nickname synchronization sessions.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides
//! - Component-wise validation
mod batcher;
mod resolver;
mod transport;
pub use batcher::*;
pub use resolver::*;
pub use transport::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

const ENV_PREFIX: &str = "NICKSYNC";

/// Configuration container for one nickname session.
///
/// Sources, later overriding earlier:
/// 1. Default values from code
/// 2. Configuration file specified by `CONFIG_PATH`
/// 3. Environment variables prefixed `NICKSYNC__`
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct SyncConfig {
    /// Cache-first read parameters
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Export debounce parameters
    #[serde(default)]
    pub batcher: BatcherConfig,
    /// Outbound channel and write confirmation parameters
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Debug for SyncConfig {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("resolver", &self.resolver)
            .field("batcher", &self.batcher)
            .field("transport", &self.transport)
            .finish()
    }
}

impl SyncConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Note
    /// Validation is deferred so that `with_override_config()` can still be
    /// applied. Callers must call `validate()` before use.
    ///
    /// # Examples
    /// ```ignore
    /// std::env::set_var("NICKSYNC__RESOLVER__INQUIRY_TIMEOUT_MS", "500");
    /// let cfg = SyncConfig::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies overrides from a file on top of the current values, then
    /// re-applies environment variables. No validation.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Consumes self and validates every section.
    pub fn validate(self) -> Result<Self> {
        self.resolver.validate()?;
        self.batcher.validate()?;
        self.transport.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}
