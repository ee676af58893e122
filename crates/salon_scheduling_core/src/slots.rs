//! crates/salon_scheduling_core/src/slots.rs
//!
//! Enumerates the start times at which a service can be booked on one day.
//!
//! Busy time is tracked at slot resolution: every booking marks each slot
//! boundary it touches, flooring its start to the boundary that contains it.
//! A booking of `[09:07, 09:50)` therefore occupies both the 09:00 and the
//! 09:30 slot. Candidates are rejected as soon as any slot they touch is
//! marked.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use tracing::debug;

use crate::domain::{BusyInterval, DaySlots, OperatingHours};
use crate::error::SchedulingResult;
use crate::time::{bounded_minutes, local_instant, start_of_day, touched_slots};

#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    granularity: Duration,
}

impl SlotGenerator {
    /// Granularity must lie within `1..=MAX_MINUTES`.
    pub fn new(granularity_minutes: i64) -> SchedulingResult<Self> {
        Ok(Self {
            granularity: bounded_minutes(granularity_minutes, "slot granularity")?,
        })
    }

    /// Bookable starts on `date` for a service of `duration_minutes`.
    ///
    /// `busy` may be unsorted and may overlap itself. Returns
    /// [`DaySlots::Closed`] when the salon does not open that day; an open day
    /// with nothing free yields an empty [`DaySlots::Open`].
    pub fn generate(
        &self,
        date: NaiveDate,
        hours: &OperatingHours,
        offset: FixedOffset,
        duration_minutes: i64,
        busy: &[BusyInterval],
    ) -> SchedulingResult<DaySlots> {
        let duration = bounded_minutes(duration_minutes, "service duration")?;
        if hours.closed {
            return Ok(DaySlots::Closed);
        }

        let day_start = start_of_day(date, offset);
        let open_time = local_instant(date, hours.open, offset);
        let close_time = local_instant(date, hours.close, offset);
        let last_slot_start = close_time - duration;
        if last_slot_start < open_time {
            debug!(%date, duration_minutes, "service does not fit in the opening window");
            return Ok(DaySlots::Open(Vec::new()));
        }

        let occupied = self.occupied_slots(busy, day_start);

        let candidates =
            std::iter::successors(Some(open_time), |t| t.checked_add_signed(self.granularity))
                .take_while(|t| *t <= last_slot_start);
        let starts: Vec<DateTime<Utc>> = candidates
            .filter(|candidate| {
                touched_slots(*candidate, *candidate + duration, day_start, self.granularity)
                    .all(|slot| !occupied.contains(&slot))
            })
            .collect();

        debug!(
            %date,
            busy = busy.len(),
            free = starts.len(),
            "generated slots"
        );
        Ok(DaySlots::Open(starts))
    }

    /// Every slot boundary touched by at least one busy interval.
    fn occupied_slots(
        &self,
        busy: &[BusyInterval],
        day_start: DateTime<Utc>,
    ) -> HashSet<DateTime<Utc>> {
        busy.iter()
            .flat_map(|interval| {
                touched_slots(interval.start, interval.end, day_start, self.granularity)
            })
            .collect()
    }
}
