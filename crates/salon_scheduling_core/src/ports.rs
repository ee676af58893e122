//! crates/salon_scheduling_core/src/ports.rs
//!
//! Defines the collaborator contracts (traits) the scheduling core consults.
//! These traits form the boundary of the hexagonal architecture, so the core
//! never cares whether salons and bookings live in Postgres or in memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Appointment, AppointmentStatus, NewAppointment, SalonHours, ServiceInfo};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The store refused a write because it would overlap an existing booking.
    #[error("Write conflicts with existing data: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Collaborator Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait SalonHoursProvider: Send + Sync {
    /// Returns the weekly opening hours of a salon.
    async fn get_hours(&self, salon_id: Uuid) -> PortResult<SalonHours>;
}

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Returns the duration and price of a service.
    async fn get_service(&self, service_id: Uuid) -> PortResult<ServiceInfo>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Appointments of `staff_id` whose start lies in `[start, end)` and whose
    /// status is one of `statuses`, ordered by start.
    async fn find_by_staff_and_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> PortResult<Vec<Appointment>>;

    async fn create(&self, appointment: NewAppointment) -> PortResult<Appointment>;

    async fn get_by_id(&self, appointment_id: Uuid) -> PortResult<Appointment>;

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment>;
}
