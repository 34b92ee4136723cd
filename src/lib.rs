//! Per-session nickname synchronization: a cache-first resolver, a
//! confirmation-gated writer and a debounced exporter over a pluggable
//! transport.

mod batcher;
mod config;
mod constants;
mod correlator;
mod errors;
mod event;
mod identity;
mod mutator;
mod resolver;
mod session;
mod sink;
mod store;
mod transport;

pub mod metrics;

pub use batcher::*;
pub use config::*;
pub use correlator::*;
pub use errors::*;
pub use event::*;
pub use identity::*;
pub use mutator::*;
pub use resolver::*;
pub use session::*;
pub use sink::*;
pub use store::*;
pub use transport::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
