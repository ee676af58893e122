pub mod conflict;
pub mod domain;
pub mod error;
pub mod ports;
pub mod scheduler;
pub mod slots;
pub mod time;

#[cfg(test)]
mod testutils;

pub use conflict::{ConflictChecker, OverlapRule};
pub use domain::{
    Appointment, AppointmentRequest, AppointmentStatus, Availability, BusyInterval, DaySlots,
    NewAppointment, OperatingHours, SalonHours, ServiceInfo,
};
pub use error::{SchedulingError, SchedulingResult};
pub use ports::{AppointmentRepository, PortError, PortResult, SalonHoursProvider, ServiceCatalog};
pub use scheduler::{RequestedDay, SchedulingService};
pub use slots::SlotGenerator;
