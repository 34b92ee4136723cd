// -
// Timing defaults

/// Bound on a cache-miss inquiry wait
pub(crate) const DEFAULT_INQUIRY_TIMEOUT_MS: u64 = 3_000;

/// Export debounce window
pub(crate) const DEFAULT_QUIET_PERIOD_MS: u64 = 3_000;

/// Write confirmation bound
pub(crate) const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

// -
// Channel capacities

pub(crate) const DEFAULT_OUTBOUND_BUFFER: usize = 128;

pub(crate) const DEFAULT_FAILURE_CHANNEL_CAPACITY: usize = 16;
