//! Time-related constants

/// Milliseconds per second
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: u8 = 60;

/// Total budget for the startup network time sync, milliseconds
///
/// Sync attempts are retried within this window; after it elapses the node
/// keeps running on whatever default time it has.
pub const NTP_SYNC_BUDGET_MS: u64 = 10_000;
