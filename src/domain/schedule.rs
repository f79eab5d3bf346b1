//! Slot scheduling
//!
//! Publishing happens on a fixed cadence. Each cadence step is a *slot*; slot
//! `i` after the last published timestamp is `last + i * interval`. A run
//! publishes at most one draft per slot that has come due since the last run,
//! so a cron job that was offline for a week catches up on its next run.
//!
//! On the very first run there is no last published timestamp. It is seeded to
//! one interval before the configured backfill start so that the first slot
//! lands exactly on the backfill start.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Publish cadence: a positive interval and the backfill start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    backfill_start: DateTime<Utc>,
    /// One interval before the backfill start
    seed: DateTime<Utc>,
}

impl Schedule {
    /// Creates a schedule. Returns `None` if the interval is not positive or
    /// the seed one interval before `backfill_start` is out of range.
    pub fn new(interval: Duration, backfill_start: DateTime<Utc>) -> Option<Self> {
        if interval <= Duration::zero() {
            return None;
        }
        let seed = backfill_start.checked_sub_signed(interval)?;
        Some(Self {
            interval,
            backfill_start,
            seed,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn backfill_start(&self) -> DateTime<Utc> {
        self.backfill_start
    }

    /// Resolves the stored last published timestamp, seeding it on first run
    pub fn effective_last(&self, stored: Option<DateTime<Utc>>) -> DateTime<Utc> {
        stored.unwrap_or(self.seed)
    }

    /// Number of whole slots elapsed: the largest `k` with
    /// `last + k * interval <= now`, or 0 if `now` is before the first slot
    pub fn due_slots(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
        if now < last {
            return 0;
        }
        let elapsed = now - last;
        match (elapsed.num_nanoseconds(), self.interval.num_nanoseconds()) {
            (Some(elapsed), Some(interval)) => (elapsed / interval) as u64,
            // Spans too long for nanosecond precision fall back to milliseconds
            _ => (elapsed.num_milliseconds() / self.interval.num_milliseconds().max(1)) as u64,
        }
    }

    /// Timestamp of the `index`-th slot after `last` (1-based), saturating at
    /// the latest representable instant
    pub fn slot(&self, last: DateTime<Utc>, index: u64) -> DateTime<Utc> {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        self.interval
            .checked_mul(index)
            .and_then(|offset| last.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The earliest time a new slot comes due after `last`
    pub fn next_due(&self, last: DateTime<Utc>) -> DateTime<Utc> {
        self.slot(last, 1)
    }
}

/// Formats a timestamp the way manifests and the state file store it:
/// `2024-12-01T00:00:00Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses an RFC 3339 timestamp (any offset) into UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
}
