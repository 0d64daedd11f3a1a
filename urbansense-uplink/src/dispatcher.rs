//! Uplink dispatcher
//!
//! Bridges the core's [`BucketSink`] seam to the cloud sink: verifies the
//! network link (with one bounded reconnect) before each POST, joins node
//! identity onto the bucket, and accounts for every outcome in
//! [`LinkStats`]. The relay path drains the core's single-slot mailbox and
//! forwards through exactly the same code path as local buckets.
//!
//! Failures drop the record. The dispatcher never retries and never
//! buffers: delivery is at-most-once end to end.

use std::time::Duration;

use urbansense_core::{
    BucketSink, CompletedBucket, NodeIdentity, RelayMailbox, RemoteBucketMessage,
};

use crate::sink::{RowSink, SensorRow, SinkError};
use crate::{LinkStats, NetworkLink};

/// Default budget for one reconnect attempt
const DEFAULT_RECONNECT_TIMEOUT_SECS: u64 = 15;

/// Dispatcher for completed buckets, local and relayed
pub struct UplinkDispatcher<S: RowSink, L: NetworkLink> {
    sink: S,
    link: L,
    reconnect_timeout: Duration,
    stats: LinkStats,
    last_relay_seq: Option<(u32, u32)>,
}

impl<S: RowSink, L: NetworkLink> UplinkDispatcher<S, L> {
    pub fn new(sink: S, link: L) -> Self {
        Self {
            sink,
            link,
            reconnect_timeout: Duration::from_secs(DEFAULT_RECONNECT_TIMEOUT_SECS),
            stats: LinkStats::default(),
            last_relay_seq: None,
        }
    }

    /// Override the reconnect budget
    pub fn with_reconnect_timeout(mut self, timeout: Duration) -> Self {
        self.reconnect_timeout = timeout;
        self
    }

    /// Traffic counters
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Drain the relay mailbox and forward its message as if local
    ///
    /// `remote` is the originating node's statically known identity.
    /// Returns `None` when nothing was pending. Only the most recently
    /// received message survives in the mailbox; anything it displaced is
    /// already gone by the time this runs.
    pub fn forward_relayed(
        &mut self,
        mailbox: &RelayMailbox,
        remote: &NodeIdentity,
    ) -> Option<Result<(), SinkError>> {
        let msg = mailbox.take()?;
        self.note_relay_seq(&msg);
        self.stats.relay_forwarded += 1;
        let bucket = msg.to_bucket();
        Some(self.publish(remote, &bucket))
    }

    /// Sequence accounting on the relay leg: diagnostics only, never
    /// dedup or ordering enforcement
    fn note_relay_seq(&mut self, msg: &RemoteBucketMessage) {
        if let Some((node_id, last)) = self.last_relay_seq {
            if node_id == msg.node_id && msg.seq > last.wrapping_add(1) {
                self.stats.relay_gaps += 1;
                log::info!(
                    "relay seq gap from node {}: {} -> {} (messages lost in flight or overwritten)",
                    msg.node_id,
                    last,
                    msg.seq
                );
            }
        }
        self.last_relay_seq = Some((msg.node_id, msg.seq));
    }

    fn ensure_link(&mut self) -> bool {
        if self.link.is_up() {
            return true;
        }
        log::info!("link down, attempting reconnect");
        match self.link.reconnect(self.reconnect_timeout) {
            Ok(()) => {
                self.stats.reconnects += 1;
                true
            }
            Err(e) => {
                log::warn!("reconnect failed: {}", e);
                false
            }
        }
    }
}

impl<S: RowSink, L: NetworkLink> BucketSink for UplinkDispatcher<S, L> {
    type Error = SinkError;

    fn publish(
        &mut self,
        identity: &NodeIdentity,
        bucket: &CompletedBucket,
    ) -> Result<(), Self::Error> {
        if !self.ensure_link() {
            self.stats.rows_dropped += 1;
            return Err(SinkError::Transport("link down".into()));
        }

        let row = SensorRow::from_bucket(identity, bucket);
        match self.sink.insert(&row) {
            Ok(()) => {
                self.stats.rows_sent += 1;
                log::debug!(
                    "row sent: sensor {} bucket {}",
                    row.sensor_id,
                    row.ts_utc
                );
                Ok(())
            }
            Err(e) => {
                self.stats.rows_dropped += 1;
                log::warn!(
                    "row dropped: sensor {} bucket {}: {}",
                    row.sensor_id,
                    row.ts_utc,
                    e
                );
                Err(e)
            }
        }
    }
}
