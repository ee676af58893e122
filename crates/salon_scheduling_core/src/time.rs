//! crates/salon_scheduling_core/src/time.rs
//!
//! Time arithmetic shared by slot generation and conflict detection.
//! All instants are UTC; wall-clock values are anchored to a salon's offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::error::SchedulingError;

/// Default distance between two bookable start times, in minutes.
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: i64 = 30;

/// Upper bound for slot granularities and service durations, in minutes.
pub const MAX_MINUTES: i64 = 24 * 60;

/// Parses a strict, zero-padded 24-hour `"HH:MM"` value.
pub fn parse_clock(value: &str) -> Result<NaiveTime, SchedulingError> {
    let invalid = || SchedulingError::InvalidInput(format!("'{}' is not a valid HH:MM time", value));
    if value.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| invalid())
}

/// The instant at which `time` occurs on `date` in the given offset.
pub fn local_instant(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    // A fixed offset has no gaps or folds, so the mapping is always unique.
    let local = date.and_time(time) - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&local)
}

/// Local midnight of `date`, as a UTC instant.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    local_instant(date, NaiveTime::MIN, offset)
}

/// The half-open UTC window `[midnight, next midnight)` covering `date` locally.
pub fn day_window(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date, offset);
    (start, start + Duration::days(1))
}

/// Floors `instant` to the slot boundary at or before it, where boundaries
/// are spaced `granularity` apart starting at `day_start`.
pub fn floor_to_slot(
    instant: DateTime<Utc>,
    day_start: DateTime<Utc>,
    granularity: Duration,
) -> DateTime<Utc> {
    let step = granularity.num_seconds();
    let elapsed = (instant - day_start).num_seconds();
    day_start + Duration::seconds(elapsed.div_euclid(step) * step)
}

/// Slot boundaries touched by `[start, end)`: the boundary containing `start`
/// and every later one strictly before `end`.
pub fn touched_slots(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    day_start: DateTime<Utc>,
    granularity: Duration,
) -> impl Iterator<Item = DateTime<Utc>> {
    let first = floor_to_slot(start, day_start, granularity);
    std::iter::successors(Some(first), move |t| t.checked_add_signed(granularity))
        .take_while(move |t| *t < end)
}

/// Converts a minute count into a `Duration`, accepting `1..=MAX_MINUTES`.
pub fn bounded_minutes(minutes: i64, what: &str) -> Result<Duration, SchedulingError> {
    if !(1..=MAX_MINUTES).contains(&minutes) {
        return Err(SchedulingError::InvalidInput(format!(
            "{} must be between 1 and {} minutes, got {}",
            what, MAX_MINUTES, minutes
        )));
    }
    Ok(Duration::minutes(minutes))
}
