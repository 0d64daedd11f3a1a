//! Time management for sensor nodes
//!
//! Provides the calendar clock abstraction the aggregator depends on, backed
//! by different sources depending on deployment:
//! - Battery-backed external RTC (absence is fatal at boot)
//! - Network time sync at startup (bounded retry, epoch fallback)
//! - Host system clock (std, for simulation)
//! - Fixed clock (tests)
//!
//! Bucket boundaries are detected from calendar *fields*, not from elapsed
//! durations, so every source exposes the same broken-down read contract.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::errors::ClockError;

/// Milliseconds since device boot
pub type Timestamp = u64;

/// Wall-clock time broken into calendar fields
///
/// The value is whatever the configured source reports; the network treats
/// it as UTC unless a deployment says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarTime {
    /// Calendar year (e.g. 2025)
    pub year: u16,
    /// Month, 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
}

impl CalendarTime {
    /// Build from a chrono naive datetime
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year() as u16,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
        }
    }

    /// Convert to a chrono naive datetime; `None` if the fields are not a
    /// valid calendar instant
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
            .and_then(|d| d.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32))
    }
}

/// Monotonic milliseconds-since-boot source
///
/// Backs sample-period gating and the network-time clock. Implementations
/// wrap a hardware timer; tests use a counter.
pub trait Uptime {
    /// Milliseconds since boot
    fn now_ms(&self) -> Timestamp;
}

/// Source of calendar time for the aggregator
///
/// `now` must be cheap and non-blocking: it is queried every loop iteration.
pub trait ClockSource {
    /// Current wall-clock time, broken into calendar fields
    fn now(&mut self) -> CalendarTime;
}

/// Battery-backed hardware RTC register interface
pub trait RtcDevice {
    /// Whether the device responds on the bus
    fn probe(&mut self) -> bool;

    /// Read the current time; infallible once the device has been probed
    fn read(&mut self) -> CalendarTime;
}

/// Network time fetch, one round trip
///
/// Implementations block for at most their own protocol timeout per call.
pub trait NtpTransport {
    /// Fetch current Unix time in seconds
    fn fetch_unix_seconds(&mut self) -> Result<i64, ClockError>;
}

/// RTC-backed clock source
///
/// Construction probes the device; absence is a fatal configuration fault
/// and the caller is expected to halt boot.
pub struct RtcClock<D: RtcDevice> {
    device: D,
}

impl<D: RtcDevice> RtcClock<D> {
    /// Probe the RTC and wrap it; `Err(ClockError::DeviceAbsent)` if the
    /// device does not respond
    pub fn new(mut device: D) -> Result<Self, ClockError> {
        if !device.probe() {
            return Err(ClockError::DeviceAbsent);
        }
        Ok(Self { device })
    }
}

impl<D: RtcDevice> ClockSource for RtcClock<D> {
    fn now(&mut self) -> CalendarTime {
        self.device.read()
    }
}

/// Network-time-backed clock source
///
/// Holds a synced base instant plus the monotonic uptime at which it was
/// captured; `now` is base + elapsed. Until [`sync`](Self::sync) succeeds
/// the base is the Unix epoch, so bucket keys are wrong: the node keeps
/// running and relies on a later resync.
pub struct NtpClock<U: Uptime> {
    base: NaiveDateTime,
    base_uptime_ms: Timestamp,
    uptime: U,
    synced: bool,
}

impl<U: Uptime> NtpClock<U> {
    /// Create an unsynced clock serving epoch-based time
    pub fn new(uptime: U) -> Self {
        Self {
            base: DateTime::UNIX_EPOCH.naive_utc(),
            base_uptime_ms: 0,
            uptime,
            synced: false,
        }
    }

    /// Attempt to sync, retrying until `budget_ms` of uptime has elapsed
    ///
    /// Each transport call blocks for at most the transport's own timeout.
    /// On failure the clock stays usable with its previous base.
    pub fn sync<T: NtpTransport>(
        &mut self,
        transport: &mut T,
        budget_ms: u64,
    ) -> Result<(), ClockError> {
        let deadline = self.uptime.now_ms().saturating_add(budget_ms);
        loop {
            match transport
                .fetch_unix_seconds()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
            {
                Some(dt) => {
                    self.base = dt.naive_utc();
                    self.base_uptime_ms = self.uptime.now_ms();
                    self.synced = true;
                    log::info!("time synced: base {}", self.base);
                    return Ok(());
                }
                None if self.uptime.now_ms() < deadline => continue,
                None => {
                    log::warn!("time sync failed, continuing on default time");
                    return Err(ClockError::SyncFailed);
                }
            }
        }
    }

    /// Whether a sync has ever succeeded
    pub fn is_synced(&self) -> bool {
        self.synced
    }
}

impl<U: Uptime> ClockSource for NtpClock<U> {
    fn now(&mut self) -> CalendarTime {
        let elapsed = self.uptime.now_ms().saturating_sub(self.base_uptime_ms);
        let dt = self.base + chrono::Duration::milliseconds(elapsed as i64);
        CalendarTime::from_naive(dt)
    }
}

/// Host system clock (simulation and gateway deployments)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl ClockSource for SystemClock {
    fn now(&mut self) -> CalendarTime {
        CalendarTime::from_naive(chrono::Utc::now().naive_utc())
    }
}

/// Settable clock for tests
///
/// Jumps and advances are explicit, so scenarios like multi-minute stalls
/// are a single call.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: NaiveDateTime,
}

impl FixedClock {
    /// Create at the given calendar instant; `None` if the fields are invalid
    pub fn at(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        CalendarTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
        .to_naive()
        .map(|current| Self { current })
    }

    /// Jump to an arbitrary instant; returns `false` (unchanged) if invalid
    pub fn set(&mut self, t: CalendarTime) -> bool {
        match t.to_naive() {
            Some(dt) => {
                self.current = dt;
                true
            }
            None => false,
        }
    }

    /// Advance by whole seconds, with calendar carry
    pub fn advance_seconds(&mut self, secs: u64) {
        self.current += chrono::Duration::seconds(secs as i64);
    }
}

impl ClockSource for FixedClock {
    fn now(&mut self) -> CalendarTime {
        CalendarTime::from_naive(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingUptime(core::cell::Cell<Timestamp>);

    impl Uptime for CountingUptime {
        fn now_ms(&self) -> Timestamp {
            // Each query advances 100ms, simulating time passing between retries
            let t = self.0.get();
            self.0.set(t + 100);
            t
        }
    }

    struct FailingNtp;

    impl NtpTransport for FailingNtp {
        fn fetch_unix_seconds(&mut self) -> Result<i64, ClockError> {
            Err(ClockError::SyncFailed)
        }
    }

    struct GoodNtp(i64);

    impl NtpTransport for GoodNtp {
        fn fetch_unix_seconds(&mut self) -> Result<i64, ClockError> {
            Ok(self.0)
        }
    }

    #[test]
    fn fixed_clock_advances_across_minute() {
        let mut clock = FixedClock::at(2025, 7, 14, 12, 0, 59).unwrap();
        assert_eq!(clock.now().second, 59);

        clock.advance_seconds(1);
        let t = clock.now();
        assert_eq!((t.minute, t.second), (1, 0));
    }

    #[test]
    fn fixed_clock_carries_across_midnight() {
        let mut clock = FixedClock::at(2025, 12, 31, 23, 59, 30).unwrap();
        clock.advance_seconds(60);
        let t = clock.now();
        assert_eq!((t.year, t.month, t.day), (2026, 1, 1));
        assert_eq!((t.hour, t.minute, t.second), (0, 0, 30));
    }

    #[test]
    fn fixed_clock_rejects_invalid_fields() {
        assert!(FixedClock::at(2025, 2, 30, 0, 0, 0).is_none());
        let mut clock = FixedClock::at(2025, 6, 1, 0, 0, 0).unwrap();
        let before = clock.now();
        assert!(!clock.set(CalendarTime {
            year: 2025,
            month: 13,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }));
        assert_eq!(clock.now(), before);
    }

    #[test]
    fn ntp_clock_serves_epoch_until_synced() {
        let mut clock = NtpClock::new(CountingUptime(core::cell::Cell::new(0)));
        assert!(!clock.is_synced());
        let t = clock.now();
        assert_eq!((t.year, t.month, t.day), (1970, 1, 1));
    }

    #[test]
    fn ntp_sync_failure_is_bounded() {
        let mut clock = NtpClock::new(CountingUptime(core::cell::Cell::new(0)));
        let err = clock.sync(&mut FailingNtp, 1_000).unwrap_err();
        assert_eq!(err, ClockError::SyncFailed);
        assert!(!clock.is_synced());
    }

    #[test]
    fn ntp_sync_sets_base() {
        let mut clock = NtpClock::new(CountingUptime(core::cell::Cell::new(0)));
        // 2025-07-14 12:34:56 UTC
        clock.sync(&mut GoodNtp(1_752_496_496), 1_000).unwrap();
        assert!(clock.is_synced());
        let t = clock.now();
        assert_eq!((t.year, t.month, t.day), (2025, 7, 14));
        assert_eq!((t.hour, t.minute), (12, 34));
    }

    struct AbsentRtc;

    impl RtcDevice for AbsentRtc {
        fn probe(&mut self) -> bool {
            false
        }

        fn read(&mut self) -> CalendarTime {
            unreachable!("never constructed")
        }
    }

    #[test]
    fn missing_rtc_is_fatal_at_construction() {
        assert!(matches!(
            RtcClock::new(AbsentRtc),
            Err(ClockError::DeviceAbsent)
        ));
    }
}
