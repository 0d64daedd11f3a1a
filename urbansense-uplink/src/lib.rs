//! Uplink for the urbansense sensor network
//!
//! ## Overview
//!
//! This crate moves completed minute buckets from a node to the cloud
//! datastore. Two paths converge here:
//!
//! - **Local origin**: the node's own aggregator flushes a bucket and the
//!   dispatcher POSTs it to the sink directly.
//! - **Relay**: a remote node's bucket arrives over the point-to-point
//!   radio into the core's single-slot mailbox; the dispatcher drains it,
//!   re-attaches the remote node's static identity, and forwards it on the
//!   same path.
//!
//! ## Delivery semantics
//!
//! Best-effort, at-most-once. A POST either succeeds within its timeout or
//! the record is logged and permanently dropped: no retry, no buffering
//! for resend, no acknowledgment back to the originating node. Before each
//! POST the dispatcher verifies the network link and attempts one bounded,
//! synchronous reconnect.
//!
//! Everything here is synchronous with explicit timeouts: the main loop's
//! bucket-rollover timing depends on these calls returning within budget,
//! so they are never converted to fire-and-forget.

use std::time::Duration;

use thiserror::Error;

pub mod dispatcher;
pub mod sink;

pub use dispatcher::UplinkDispatcher;
pub use sink::{CloudSink, RowSink, SensorRow, SinkConfig, SinkError};

/// Network link failures
#[derive(Debug, Error)]
pub enum LinkError {
    /// Link is down and no reconnect was attempted
    #[error("link down")]
    Down,

    /// Reconnect did not complete within its budget
    #[error("reconnect timed out after {0:?}")]
    Timeout(Duration),
}

/// WiFi (or equivalent) link management
///
/// `reconnect` blocks for at most `timeout`; there is no cancellation: a
/// stalled attempt fails after its budget and the caller moves on.
pub trait NetworkLink {
    /// Whether the link is currently usable
    fn is_up(&mut self) -> bool;

    /// Synchronously re-establish the link, bounded by `timeout`
    fn reconnect(&mut self, timeout: Duration) -> Result<(), LinkError>;
}

/// Link that is always up (wired gateways, simulation)
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysUp;

impl NetworkLink for AlwaysUp {
    fn is_up(&mut self) -> bool {
        true
    }

    fn reconnect(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        Ok(())
    }
}

/// Dispatcher traffic counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkStats {
    /// Rows accepted by the sink
    pub rows_sent: u64,
    /// Rows dropped (link down, transport failure, or sink rejection)
    pub rows_dropped: u64,
    /// Successful reconnects performed before a POST
    pub reconnects: u32,
    /// Relayed buckets forwarded
    pub relay_forwarded: u64,
    /// Sequence-number gaps observed on the relay leg (diagnostic only)
    pub relay_gaps: u32,
}
