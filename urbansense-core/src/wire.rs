//! Radio wire format for relayed buckets
//!
//! Fixed little-endian layout carrying one completed bucket from a remote
//! node to the relay, minus location metadata (the relay knows the remote
//! node's placement statically):
//!
//! ```text
//! offset  field
//!  0..4   node_id    u32
//!  4..8   seq        u32   monotonically increasing, diagnostics only
//!  8..12  uptime_ms  u32
//! 12..14  year       u16
//! 14      month      u8
//! 15      day        u8
//! 16      hour       u8
//! 17      minute     u8
//! 18..22  avg_spl_db f32
//! 22..26  max_spl_db f32
//! 26..30  avg_dbfs   f32
//! 30..34  n_samples  u32
//! 34..38  temp_c     f32   only in the newer version
//! ```
//!
//! Two historical versions exist, distinguished *solely* by total length:
//! 34 bytes (no temperature) and 38 bytes (with). Any other length is
//! rejected as [`WireError::UnrecognizedLength`]: frames are never
//! reinterpreted by guesswork.

use crate::bucket::{BucketKey, CompletedBucket, SPL_MAX_SENTINEL};
use crate::errors::WireError;
use crate::node::{BucketSink, NodeIdentity};
use crate::time::Uptime;

/// Encoded length of the original message version (no temperature)
pub const WIRE_LEN_BASE: usize = 34;

/// Encoded length of the current message version (with temperature)
pub const WIRE_LEN_WITH_TEMP: usize = 38;

/// Wire form of a completed bucket
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteBucketMessage {
    /// Originating node identifier
    pub node_id: u32,
    /// Per-node message counter; transmitted for diagnostics, never used
    /// for dedup or ordering
    pub seq: u32,
    /// Sender uptime at transmission, milliseconds (wrapping)
    pub uptime_ms: u32,
    /// Bucket this message carries
    pub key: BucketKey,
    /// Mean estimated SPL over the bucket, dB
    pub avg_spl_db: f32,
    /// Maximum estimated SPL, dB
    pub max_spl_db: f32,
    /// Mean smoothed dBFS
    pub avg_dbfs: f32,
    /// Loudness readings accumulated in the bucket
    pub sample_count: u32,
    /// Present only in the newer message version
    pub temp_c: Option<f32>,
}

impl RemoteBucketMessage {
    /// Build the wire form of a completed bucket
    pub fn from_bucket(node_id: u32, seq: u32, uptime_ms: u32, bucket: &CompletedBucket) -> Self {
        Self {
            node_id,
            seq,
            uptime_ms,
            key: bucket.key,
            avg_spl_db: bucket.avg_spl_db,
            max_spl_db: bucket.max_spl_db,
            avg_dbfs: bucket.avg_dbfs,
            sample_count: bucket.loudness_samples,
            temp_c: bucket.avg_celsius,
        }
    }

    /// Reconstruct the bucket at the relay
    pub fn to_bucket(&self) -> CompletedBucket {
        CompletedBucket {
            key: self.key,
            avg_spl_db: self.avg_spl_db,
            max_spl_db: self.max_spl_db,
            avg_dbfs: self.avg_dbfs,
            loudness_samples: self.sample_count,
            avg_celsius: self.temp_c,
        }
    }

    /// Encode into `buf`, returning the frame length (34 or 38)
    pub fn encode(&self, buf: &mut [u8; WIRE_LEN_WITH_TEMP]) -> usize {
        buf[0..4].copy_from_slice(&self.node_id.to_le_bytes());
        buf[4..8].copy_from_slice(&self.seq.to_le_bytes());
        buf[8..12].copy_from_slice(&self.uptime_ms.to_le_bytes());
        buf[12..14].copy_from_slice(&self.key.year.to_le_bytes());
        buf[14] = self.key.month;
        buf[15] = self.key.day;
        buf[16] = self.key.hour;
        buf[17] = self.key.minute;
        buf[18..22].copy_from_slice(&self.avg_spl_db.to_le_bytes());
        buf[22..26].copy_from_slice(&self.max_spl_db.to_le_bytes());
        buf[26..30].copy_from_slice(&self.avg_dbfs.to_le_bytes());
        buf[30..34].copy_from_slice(&self.sample_count.to_le_bytes());
        match self.temp_c {
            Some(t) => {
                buf[34..38].copy_from_slice(&t.to_le_bytes());
                WIRE_LEN_WITH_TEMP
            }
            None => WIRE_LEN_BASE,
        }
    }

    /// Decode a received frame, switching on total length alone
    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        let temp_c = match frame.len() {
            WIRE_LEN_BASE => None,
            WIRE_LEN_WITH_TEMP => Some(f32::from_le_bytes(get4(frame, 34))),
            len => return Err(WireError::UnrecognizedLength { len }),
        };

        Ok(Self {
            node_id: u32::from_le_bytes(get4(frame, 0)),
            seq: u32::from_le_bytes(get4(frame, 4)),
            uptime_ms: u32::from_le_bytes(get4(frame, 8)),
            key: BucketKey {
                year: u16::from_le_bytes([frame[12], frame[13]]),
                month: frame[14],
                day: frame[15],
                hour: frame[16],
                minute: frame[17],
            },
            avg_spl_db: f32::from_le_bytes(get4(frame, 18)),
            max_spl_db: f32::from_le_bytes(get4(frame, 22)),
            avg_dbfs: f32::from_le_bytes(get4(frame, 26)),
            sample_count: u32::from_le_bytes(get4(frame, 30)),
            temp_c,
        })
    }
}

fn get4(b: &[u8], at: usize) -> [u8; 4] {
    [b[at], b[at + 1], b[at + 2], b[at + 3]]
}

/// Point-to-point radio transmit side
///
/// Best-effort, unordered, at-most-once; no acknowledgment comes back.
pub trait RadioTx {
    /// Transmit failure, surfaced for logging only
    type Error: core::fmt::Debug;

    /// Transmit one frame
    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}

/// Bucket sink that egresses over the radio (the remote node's uplink)
///
/// Stamps each message with the node id, a fresh sequence number, and the
/// current uptime. Identity metadata is dropped on the wire; the relay
/// re-attaches it statically.
pub struct RadioBucketSink<R: RadioTx, U: Uptime> {
    radio: R,
    uptime: U,
    node_id: u32,
    seq: u32,
}

impl<R: RadioTx, U: Uptime> RadioBucketSink<R, U> {
    /// Create with this node's wire identifier
    pub fn new(node_id: u32, radio: R, uptime: U) -> Self {
        Self {
            radio,
            uptime,
            node_id,
            seq: 0,
        }
    }

    /// Last sequence number transmitted
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Access the underlying radio (diagnostics, tests)
    pub fn radio(&self) -> &R {
        &self.radio
    }
}

impl<R: RadioTx, U: Uptime> BucketSink for RadioBucketSink<R, U> {
    type Error = R::Error;

    fn publish(
        &mut self,
        _identity: &NodeIdentity,
        bucket: &CompletedBucket,
    ) -> Result<(), Self::Error> {
        self.seq = self.seq.wrapping_add(1);
        let msg = RemoteBucketMessage::from_bucket(
            self.node_id,
            self.seq,
            self.uptime.now_ms() as u32,
            bucket,
        );
        let mut buf = [0u8; WIRE_LEN_WITH_TEMP];
        let len = msg.encode(&mut buf);
        self.radio.transmit(&buf[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(temp_c: Option<f32>) -> RemoteBucketMessage {
        RemoteBucketMessage {
            node_id: 7,
            seq: 41,
            uptime_ms: 123_456,
            key: BucketKey {
                year: 2025,
                month: 7,
                day: 14,
                hour: 12,
                minute: 30,
            },
            avg_spl_db: 52.25,
            max_spl_db: 61.5,
            avg_dbfs: -58.75,
            sample_count: 1875,
            temp_c,
        }
    }

    #[test]
    fn versions_differ_only_by_length() {
        let mut buf = [0u8; WIRE_LEN_WITH_TEMP];
        assert_eq!(message(None).encode(&mut buf), WIRE_LEN_BASE);
        assert_eq!(message(Some(21.5)).encode(&mut buf), WIRE_LEN_WITH_TEMP);
    }

    #[test]
    fn decode_reverses_encode_for_both_versions() {
        for temp in [None, Some(21.5)] {
            let msg = message(temp);
            let mut buf = [0u8; WIRE_LEN_WITH_TEMP];
            let len = msg.encode(&mut buf);
            let decoded = RemoteBucketMessage::decode(&buf[..len]).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn unrecognized_length_is_rejected() {
        let frame = [0u8; 21];
        assert_eq!(
            RemoteBucketMessage::decode(&frame),
            Err(WireError::UnrecognizedLength { len: 21 })
        );
        assert!(RemoteBucketMessage::decode(&[]).is_err());
        assert!(RemoteBucketMessage::decode(&[0u8; 39]).is_err());
    }

    #[test]
    fn bucket_round_trips_through_wire_form() {
        let bucket = CompletedBucket {
            key: message(None).key,
            avg_spl_db: 50.0,
            max_spl_db: 55.0,
            avg_dbfs: -62.0,
            loudness_samples: 60,
            avg_celsius: Some(18.5),
        };
        let msg = RemoteBucketMessage::from_bucket(3, 1, 999, &bucket);
        assert_eq!(msg.to_bucket(), bucket);
    }

    #[test]
    fn empty_bucket_sentinel_survives_the_wire() {
        let bucket = CompletedBucket {
            key: message(None).key,
            avg_spl_db: 0.0,
            max_spl_db: SPL_MAX_SENTINEL,
            avg_dbfs: 0.0,
            loudness_samples: 0,
            avg_celsius: None,
        };
        let msg = RemoteBucketMessage::from_bucket(3, 1, 0, &bucket);
        let mut buf = [0u8; WIRE_LEN_WITH_TEMP];
        let len = msg.encode(&mut buf);
        assert_eq!(len, WIRE_LEN_BASE);
        let decoded = RemoteBucketMessage::decode(&buf[..len]).unwrap();
        assert_eq!(decoded.max_spl_db, SPL_MAX_SENTINEL);
        assert_eq!(decoded.temp_c, None);
    }

    struct RecordingRadio(std::vec::Vec<std::vec::Vec<u8>>);

    impl RadioTx for RecordingRadio {
        type Error = ();

        fn transmit(&mut self, frame: &[u8]) -> Result<(), ()> {
            self.0.push(frame.to_vec());
            Ok(())
        }
    }

    struct ZeroUptime;

    impl Uptime for ZeroUptime {
        fn now_ms(&self) -> u64 {
            42
        }
    }

    #[test]
    fn radio_sink_stamps_increasing_sequence_numbers() {
        let identity = NodeIdentity::new(3, 44.23, -76.49, "remote");
        let bucket = CompletedBucket {
            key: message(None).key,
            avg_spl_db: 50.0,
            max_spl_db: 55.0,
            avg_dbfs: -62.0,
            loudness_samples: 60,
            avg_celsius: None,
        };

        let mut sink = RadioBucketSink::new(3, RecordingRadio(std::vec::Vec::new()), ZeroUptime);
        sink.publish(&identity, &bucket).unwrap();
        sink.publish(&identity, &bucket).unwrap();
        assert_eq!(sink.seq(), 2);

        let frames = &sink.radio.0;
        let first = RemoteBucketMessage::decode(&frames[0]).unwrap();
        let second = RemoteBucketMessage::decode(&frames[1]).unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_eq!(first.uptime_ms, 42);
    }
}
