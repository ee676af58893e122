//! crates/salon_scheduling_core/src/domain.rs
//!
//! Defines the pure, core data structures for the scheduling engine.
//! These structs are independent of any database or serialization format.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::time::parse_clock;

//=========================================================================================
// Operating Hours
//=========================================================================================

/// The opening window of a salon on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub closed: bool,
}

impl OperatingHours {
    /// An open day. Fails unless `open < close`.
    pub fn open_between(open: NaiveTime, close: NaiveTime) -> Result<Self, SchedulingError> {
        if open >= close {
            return Err(SchedulingError::InvalidInput(format!(
                "opening time {} must be before closing time {}",
                open.format("%H:%M"),
                close.format("%H:%M")
            )));
        }
        Ok(Self {
            open,
            close,
            closed: false,
        })
    }

    /// A day on which the salon does not open at all.
    pub fn closed() -> Self {
        Self {
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            closed: true,
        }
    }

    /// Builds hours from the `"HH:MM"` strings stored alongside a salon.
    /// When `closed` is set the times are not inspected.
    pub fn parse(open: &str, close: &str, closed: bool) -> Result<Self, SchedulingError> {
        if closed {
            return Ok(Self::closed());
        }
        Self::open_between(parse_clock(open)?, parse_clock(close)?)
    }
}

/// A salon's weekly opening hours, interpreted in the salon's own UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SalonHours {
    pub salon_id: Uuid,
    pub utc_offset: FixedOffset,
    pub weekly: HashMap<Weekday, OperatingHours>,
}

impl SalonHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&OperatingHours> {
        self.weekly.get(&weekday)
    }
}

//=========================================================================================
// Services
//=========================================================================================

/// The bookable service as seen by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub id: Uuid,
    /// Length of the service in minutes.
    pub duration_minutes: i64,
    pub price: f64,
}

//=========================================================================================
// Appointments
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that occupy a staff member's time when listing availability.
    pub const BLOCKING: [AppointmentStatus; 2] =
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(SchedulingError::InvalidInput(format!(
                "unknown appointment status '{}'",
                other
            ))),
        }
    }
}

/// A persisted booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end(&self) -> DateTime<Utc> {
        self.date + Duration::minutes(self.duration_minutes)
    }

    pub fn busy_interval(&self) -> BusyInterval {
        BusyInterval {
            start: self.date,
            end: self.end(),
        }
    }
}

/// An appointment about to be written. Duration is copied from the service
/// catalog by the scheduler, never taken from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub salon_id: Uuid,
    pub staff_id: Uuid,
    pub service_id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// What a client asks for when booking.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRequest {
    pub user_id: Uuid,
    pub salon_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

//=========================================================================================
// Derived, per-request values
//=========================================================================================

/// A half-open range `[start, end)` during which a staff member is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Result of slot generation for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySlots {
    /// The salon does not open on this weekday.
    Closed,
    /// Bookable start times in ascending order. May be empty.
    Open(Vec<DateTime<Utc>>),
}

impl DaySlots {
    pub fn is_closed(&self) -> bool {
        matches!(self, DaySlots::Closed)
    }

    pub fn starts(&self) -> &[DateTime<Utc>] {
        match self {
            DaySlots::Closed => &[],
            DaySlots::Open(starts) => starts,
        }
    }
}

/// Answer to an availability query.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub date: NaiveDate,
    pub utc_offset: FixedOffset,
    pub closed: bool,
    pub slots: Vec<DateTime<Utc>>,
    pub service_duration: i64,
}

impl Availability {
    pub fn available(&self) -> bool {
        !self.slots.is_empty()
    }
}
