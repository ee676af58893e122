//! services/api/src/adapters/memory.rs
//!
//! An in-process store implementing the same ports as `DbAdapter`. Used when
//! no `DATABASE_URL` is configured and by the HTTP tests.
//!
//! Writes apply the same rule as the Postgres exclusion constraint: two
//! confirmed appointments of one staff member may not overlap. The check and
//! the insert happen under one lock, so concurrent bookings cannot both win.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc, Weekday};
use salon_scheduling_core::domain::{
    Appointment, AppointmentStatus, NewAppointment, OperatingHours, SalonHours, ServiceInfo,
};
use salon_scheduling_core::ports::{
    AppointmentRepository, PortError, PortResult, SalonHoursProvider, ServiceCatalog,
};
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    salons: HashMap<Uuid, SalonHours>,
    services: HashMap<Uuid, ServiceInfo>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryState {
    /// A confirmed appointment of the same staff member overlapping `candidate`.
    fn confirmed_overlap(&self, candidate: &Appointment) -> Option<&Appointment> {
        self.appointments.values().find(|other| {
            other.id != candidate.id
                && other.staff_id == candidate.staff_id
                && other.status == AppointmentStatus::Confirmed
                && other.date < candidate.end()
                && other.end() > candidate.date
        })
    }
}

/// Identifiers of the demo data inserted by [`InMemoryAdapter::insert_example_salon`].
#[derive(Debug, Clone, Copy)]
pub struct ExampleSalon {
    pub salon_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
}

#[derive(Clone, Default)]
pub struct InMemoryAdapter {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }

    pub fn insert_salon(&self, salon: SalonHours) -> PortResult<()> {
        self.lock()?.salons.insert(salon.salon_id, salon);
        Ok(())
    }

    pub fn insert_service(&self, service: ServiceInfo) -> PortResult<()> {
        self.lock()?.services.insert(service.id, service);
        Ok(())
    }

    /// Seeds one salon open 09:00-18:00 Monday to Saturday (closed Sunday)
    /// with a 30 minute service, so a fresh instance has something to book.
    pub fn insert_example_salon(&self) -> PortResult<ExampleSalon> {
        let example = ExampleSalon {
            salon_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
        };

        let open = OperatingHours::parse("09:00", "18:00", false)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let mut weekly: HashMap<Weekday, OperatingHours> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ]
        .into_iter()
        .map(|day| (day, open))
        .collect();
        weekly.insert(Weekday::Sun, OperatingHours::closed());

        let utc = FixedOffset::east_opt(0)
            .ok_or_else(|| PortError::Unexpected("invalid UTC offset".to_string()))?;
        self.insert_salon(SalonHours {
            salon_id: example.salon_id,
            utc_offset: utc,
            weekly,
        })?;
        self.insert_service(ServiceInfo {
            id: example.service_id,
            duration_minutes: 30,
            price: 25.0,
        })?;

        info!(
            salon_id = %example.salon_id,
            service_id = %example.service_id,
            staff_id = %example.staff_id,
            "inserted example salon"
        );
        Ok(example)
    }
}

#[async_trait]
impl SalonHoursProvider for InMemoryAdapter {
    async fn get_hours(&self, salon_id: Uuid) -> PortResult<SalonHours> {
        self.lock()?
            .salons
            .get(&salon_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Salon {} not found", salon_id)))
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryAdapter {
    async fn get_service(&self, service_id: Uuid) -> PortResult<ServiceInfo> {
        self.lock()?
            .services
            .get(&service_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Service {} not found", service_id)))
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAdapter {
    async fn find_by_staff_and_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> PortResult<Vec<Appointment>> {
        let state = self.lock()?;
        let mut found: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| {
                a.staff_id == staff_id
                    && a.date >= start
                    && a.date < end
                    && statuses.contains(&a.status)
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.date);
        Ok(found)
    }

    async fn create(&self, appointment: NewAppointment) -> PortResult<Appointment> {
        let mut state = self.lock()?;
        let created = Appointment {
            id: Uuid::new_v4(),
            salon_id: appointment.salon_id,
            staff_id: appointment.staff_id,
            service_id: appointment.service_id,
            user_id: appointment.user_id,
            date: appointment.date,
            duration_minutes: appointment.duration_minutes,
            status: appointment.status,
            notes: appointment.notes,
            created_at: Utc::now(),
        };
        if created.status == AppointmentStatus::Confirmed {
            if let Some(existing) = state.confirmed_overlap(&created) {
                return Err(PortError::Conflict(format!(
                    "overlaps confirmed appointment {}",
                    existing.id
                )));
            }
        }
        state.appointments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.lock()?
            .appointments
            .get(&appointment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment> {
        let mut state = self.lock()?;
        let mut updated = state
            .appointments
            .get(&appointment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))?;
        updated.status = status;
        if status == AppointmentStatus::Confirmed {
            if let Some(existing) = state.confirmed_overlap(&updated) {
                return Err(PortError::Conflict(format!(
                    "overlaps confirmed appointment {}",
                    existing.id
                )));
            }
        }
        state.appointments.insert(appointment_id, updated.clone());
        Ok(updated)
    }
}
