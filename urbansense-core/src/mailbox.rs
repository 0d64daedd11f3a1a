//! Single-slot relay mailbox
//!
//! The radio receive callback runs in an interrupt-like context and must
//! not block or perform I/O. It hands messages to the main loop through
//! exactly one shared slot plus a pending flag: this is the only
//! concurrent state in the system, and both sides guard every access with
//! a critical section.
//!
//! This is a mailbox, not a queue: if a second message arrives before the
//! main loop drains the first, the older one is silently overwritten and
//! lost (counted in [`MailboxStats::overwritten`]). A frame of
//! unrecognized length is rejected before it touches the slot, so the last
//! good message survives malformed traffic.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::errors::WireError;
use crate::wire::RemoteBucketMessage;

/// Mailbox traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Messages accepted into the slot
    pub delivered: u32,
    /// Accepted messages that displaced an undrained one
    pub overwritten: u32,
    /// Messages taken by the consumer
    pub drained: u32,
    /// Frames rejected for unrecognized length
    pub rejected: u32,
}

struct Inner {
    slot: Option<RemoteBucketMessage>,
    stats: MailboxStats,
}

/// Capacity-1, overwrite-on-full message cell
///
/// `const`-constructible so it can live in a `static` shared between the
/// receive callback and the main loop.
pub struct RelayMailbox {
    inner: Mutex<RefCell<Inner>>,
}

impl RelayMailbox {
    /// Create an empty mailbox; usable in a `static`
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                slot: None,
                stats: MailboxStats {
                    delivered: 0,
                    overwritten: 0,
                    drained: 0,
                    rejected: 0,
                },
            })),
        }
    }

    /// Producer side: store a decoded message, displacing any undrained one
    ///
    /// Safe to call from the receive callback: no blocking, no I/O.
    pub fn deliver(&self, msg: RemoteBucketMessage) {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            if inner.slot.is_some() {
                inner.stats.overwritten += 1;
            }
            inner.slot = Some(msg);
            inner.stats.delivered += 1;
        });
    }

    /// Producer side: decode a raw frame and store it
    ///
    /// A frame of unrecognized length is counted and rejected without
    /// touching the slot.
    pub fn deliver_frame(&self, frame: &[u8]) -> Result<(), WireError> {
        match RemoteBucketMessage::decode(frame) {
            Ok(msg) => {
                self.deliver(msg);
                Ok(())
            }
            Err(e) => {
                critical_section::with(|cs| {
                    self.inner.borrow_ref_mut(cs).stats.rejected += 1;
                });
                Err(e)
            }
        }
    }

    /// Consumer side: take the pending message, if any
    pub fn take(&self) -> Option<RemoteBucketMessage> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            let msg = inner.slot.take();
            if msg.is_some() {
                inner.stats.drained += 1;
            }
            msg
        })
    }

    /// Whether a message is waiting
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).slot.is_some())
    }

    /// Snapshot of the traffic counters
    pub fn stats(&self) -> MailboxStats {
        critical_section::with(|cs| self.inner.borrow_ref(cs).stats)
    }
}

impl Default for RelayMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::BucketKey;

    fn message(seq: u32) -> RemoteBucketMessage {
        RemoteBucketMessage {
            node_id: 3,
            seq,
            uptime_ms: 0,
            key: BucketKey {
                year: 2025,
                month: 7,
                day: 14,
                hour: 12,
                minute: 0,
            },
            avg_spl_db: 50.0,
            max_spl_db: 55.0,
            avg_dbfs: -62.0,
            sample_count: 60,
            temp_c: None,
        }
    }

    #[test]
    fn deliver_then_take() {
        let mailbox = RelayMailbox::new();
        assert!(!mailbox.is_pending());
        mailbox.deliver(message(1));
        assert!(mailbox.is_pending());
        assert_eq!(mailbox.take().unwrap().seq, 1);
        assert!(mailbox.take().is_none());
        assert_eq!(
            mailbox.stats(),
            MailboxStats {
                delivered: 1,
                overwritten: 0,
                drained: 1,
                rejected: 0,
            }
        );
    }

    #[test]
    fn second_delivery_overwrites_undrained_first() {
        let mailbox = RelayMailbox::new();
        mailbox.deliver(message(1));
        mailbox.deliver(message(2));
        assert_eq!(mailbox.take().unwrap().seq, 2);
        assert!(mailbox.take().is_none());
        let stats = mailbox.stats();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.overwritten, 1);
        assert_eq!(stats.drained, 1);
    }

    #[test]
    fn malformed_frame_preserves_last_good_message() {
        let mailbox = RelayMailbox::new();
        mailbox.deliver(message(9));

        let garbage = [0u8; 21];
        assert!(mailbox.deliver_frame(&garbage).is_err());

        // Slot untouched by the rejected frame
        assert_eq!(mailbox.take().unwrap().seq, 9);
        assert_eq!(mailbox.stats().rejected, 1);
    }

    #[test]
    fn frame_delivery_round_trips() {
        let mailbox = RelayMailbox::new();
        let msg = message(5);
        let mut buf = [0u8; crate::wire::WIRE_LEN_WITH_TEMP];
        let len = msg.encode(&mut buf);
        mailbox.deliver_frame(&buf[..len]).unwrap();
        assert_eq!(mailbox.take().unwrap(), msg);
    }
}
