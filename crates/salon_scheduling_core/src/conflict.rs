//! crates/salon_scheduling_core/src/conflict.rs
//!
//! Decides whether a candidate appointment window collides with a staff
//! member's confirmed bookings.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{Appointment, AppointmentStatus};
use crate::error::SchedulingError;
use crate::time::MAX_MINUTES;

/// Which bookings count as colliding with a candidate `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapRule {
    /// `existing.start < end && existing.end > start`.
    #[default]
    HalfOpenOverlap,
    /// `start < existing.start < end`: only the existing booking's start is
    /// tested. Kept for compatibility with the legacy booking endpoint; misses
    /// bookings that started earlier and run into the candidate.
    StartWithinWindow,
}

impl FromStr for OverlapRule {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overlap" | "half_open_overlap" => Ok(OverlapRule::HalfOpenOverlap),
            "start_in_window" | "start_within_window" => Ok(OverlapRule::StartWithinWindow),
            other => Err(SchedulingError::InvalidInput(format!(
                "unknown conflict rule '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictChecker {
    rule: OverlapRule,
}

impl ConflictChecker {
    pub fn new(rule: OverlapRule) -> Self {
        Self { rule }
    }

    /// The range of start times a repository must return so that
    /// [`ConflictChecker::find_conflict`] sees every booking that could collide.
    /// Bookings never run longer than `MAX_MINUTES`, which bounds the look-back.
    pub fn lookup_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        match self.rule {
            OverlapRule::HalfOpenOverlap => (start - Duration::minutes(MAX_MINUTES), end),
            OverlapRule::StartWithinWindow => (start, end),
        }
    }

    /// The first confirmed booking of `staff_id` that collides with
    /// `[start, end)`. Bookings of other staff, other statuses, or with the
    /// id in `ignore` never collide.
    pub fn find_conflict<'a>(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        existing: &'a [Appointment],
        ignore: Option<Uuid>,
    ) -> Option<&'a Appointment> {
        existing.iter().find(|appointment| {
            appointment.staff_id == staff_id
                && appointment.status == AppointmentStatus::Confirmed
                && Some(appointment.id) != ignore
                && self.collides(appointment, start, end)
        })
    }

    pub fn has_conflict(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        existing: &[Appointment],
    ) -> bool {
        self.find_conflict(staff_id, start, end, existing, None)
            .is_some()
    }

    fn collides(&self, appointment: &Appointment, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.rule {
            OverlapRule::HalfOpenOverlap => appointment.date < end && appointment.end() > start,
            OverlapRule::StartWithinWindow => appointment.date > start && appointment.date < end,
        }
    }
}
