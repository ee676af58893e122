//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the admin dashboard and the API
//! server, and their conversions to and from the core domain types.

use chrono::{DateTime, FixedOffset, Utc};
use salon_scheduling_core::domain::{Appointment, AppointmentStatus, Availability};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Shared
//=========================================================================================

/// Body of every error response.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatusDto {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl From<AppointmentStatusDto> for AppointmentStatus {
    fn from(dto: AppointmentStatusDto) -> Self {
        match dto {
            AppointmentStatusDto::Pending => AppointmentStatus::Pending,
            AppointmentStatusDto::Confirmed => AppointmentStatus::Confirmed,
            AppointmentStatusDto::Cancelled => AppointmentStatus::Cancelled,
            AppointmentStatusDto::Completed => AppointmentStatus::Completed,
            AppointmentStatusDto::NoShow => AppointmentStatus::NoShow,
        }
    }
}

impl From<AppointmentStatus> for AppointmentStatusDto {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Pending => AppointmentStatusDto::Pending,
            AppointmentStatus::Confirmed => AppointmentStatusDto::Confirmed,
            AppointmentStatus::Cancelled => AppointmentStatusDto::Cancelled,
            AppointmentStatus::Completed => AppointmentStatusDto::Completed,
            AppointmentStatus::NoShow => AppointmentStatusDto::NoShow,
        }
    }
}

//=========================================================================================
// Availability
//=========================================================================================

/// Query string of `GET /appointments/availability`. Every field is required;
/// they are optional here so a missing one yields a 400 with a useful message.
#[derive(Deserialize, Debug, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub salon_id: Option<String>,
    pub staff_id: Option<String>,
    pub service_id: Option<String>,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose salon-local date is used.
    pub date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotResponse {
    pub time: DateTime<Utc>,
    /// Start time on the salon's wall clock, e.g. `09:30 AM`.
    pub formatted_time: String,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    /// True when the salon does not open on the requested day at all.
    pub closed: bool,
    pub time_slots: Vec<TimeSlotResponse>,
    /// Service length in minutes.
    pub service_duration: i64,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        let offset = availability.utc_offset;
        Self {
            available: availability.available(),
            closed: availability.closed,
            time_slots: availability
                .slots
                .iter()
                .map(|slot| TimeSlotResponse {
                    time: *slot,
                    formatted_time: slot.with_timezone(&offset).format("%I:%M %p").to_string(),
                })
                .collect(),
            service_duration: availability.service_duration,
        }
    }
}

//=========================================================================================
// Appointments
//=========================================================================================

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct CreateAppointmentRequest {
    pub user_id: Uuid,
    pub salon_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    /// Requested start, RFC 3339.
    pub date: DateTime<FixedOffset>,
    pub status: Option<AppointmentStatusDto>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatusDto,
}

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub salon_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub date: DateTime<Utc>,
    /// Minutes, copied from the service at booking time.
    pub duration: i64,
    pub status: AppointmentStatusDto,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            user_id: appointment.user_id,
            salon_id: appointment.salon_id,
            service_id: appointment.service_id,
            staff_id: appointment.staff_id,
            date: appointment.date,
            duration: appointment.duration_minutes,
            status: appointment.status.into(),
            notes: appointment.notes,
            created_at: appointment.created_at,
        }
    }
}
