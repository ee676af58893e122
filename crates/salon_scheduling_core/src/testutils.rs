//! In-memory fakes of the collaborator ports for unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc, Weekday};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentStatus, NewAppointment, OperatingHours, SalonHours, ServiceInfo,
};
use crate::ports::{
    AppointmentRepository, PortError, PortResult, SalonHoursProvider, ServiceCatalog,
};

pub const DEFAULT_DURATION: i64 = 30;

type RangeQuery = (DateTime<Utc>, DateTime<Utc>, Vec<AppointmentStatus>);

pub struct FakeStoreState {
    pub fail_reads: AtomicBool,
    pub reject_writes: AtomicBool,
    pub calls_to_get_hours: AtomicU64,
    pub calls_to_get_service: AtomicU64,
    pub calls_to_find: AtomicU64,
    pub calls_to_create: AtomicU64,
    pub salon: Mutex<SalonHours>,
    pub service: Mutex<ServiceInfo>,
    pub appointments: Mutex<Vec<Appointment>>,
    pub last_range: Mutex<Option<RangeQuery>>,
}

/// One salon with one service and one staff member, open 09:00-17:00 UTC
/// every day until told otherwise.
#[derive(Clone)]
pub struct FakeStore {
    pub salon_id: Uuid,
    pub service_id: Uuid,
    pub staff_id: Uuid,
    pub state: Arc<FakeStoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        let salon_id = Uuid::new_v4();
        let service_id = Uuid::new_v4();
        let weekly: HashMap<Weekday, OperatingHours> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|day| (day, OperatingHours::parse("09:00", "17:00", false).unwrap()))
        .collect();

        let state = FakeStoreState {
            fail_reads: AtomicBool::new(false),
            reject_writes: AtomicBool::new(false),
            calls_to_get_hours: AtomicU64::default(),
            calls_to_get_service: AtomicU64::default(),
            calls_to_find: AtomicU64::default(),
            calls_to_create: AtomicU64::default(),
            salon: Mutex::new(SalonHours {
                salon_id,
                utc_offset: FixedOffset::east_opt(0).unwrap(),
                weekly,
            }),
            service: Mutex::new(ServiceInfo {
                id: service_id,
                duration_minutes: DEFAULT_DURATION,
                price: 25.0,
            }),
            appointments: Mutex::default(),
            last_range: Mutex::default(),
        };

        Self {
            salon_id,
            service_id,
            staff_id: Uuid::new_v4(),
            state: Arc::new(state),
        }
    }

    pub fn set_hours(&self, day: Weekday, open: &str, close: &str) {
        let hours = OperatingHours::parse(open, close, false).unwrap();
        self.state.salon.lock().unwrap().weekly.insert(day, hours);
    }

    pub fn set_closed(&self, day: Weekday) {
        self.state
            .salon
            .lock()
            .unwrap()
            .weekly
            .insert(day, OperatingHours::closed());
    }

    pub fn set_offset_hours(&self, hours: i32) {
        self.state.salon.lock().unwrap().utc_offset = FixedOffset::east_opt(hours * 3600).unwrap();
    }

    pub fn set_duration(&self, minutes: i64) {
        self.state.service.lock().unwrap().duration_minutes = minutes;
    }

    /// Stores a booking for the fake's staff member and returns its id.
    pub fn add_booking(
        &self,
        date: DateTime<Utc>,
        duration_minutes: i64,
        status: AppointmentStatus,
    ) -> Uuid {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            salon_id: self.salon_id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            user_id: Uuid::new_v4(),
            date,
            duration_minutes,
            status,
            notes: None,
            created_at: Utc::now(),
        };
        let id = appointment.id;
        self.state.appointments.lock().unwrap().push(appointment);
        id
    }

    fn read_result(&self) -> PortResult<()> {
        match self.state.fail_reads.load(Ordering::SeqCst) {
            true => Err(PortError::Unexpected("Supposed to fail".into())),
            false => Ok(()),
        }
    }
}

#[async_trait]
impl SalonHoursProvider for FakeStore {
    async fn get_hours(&self, salon_id: Uuid) -> PortResult<SalonHours> {
        self.state.calls_to_get_hours.fetch_add(1, Ordering::SeqCst);
        let salon = self.state.salon.lock().unwrap().clone();
        if salon.salon_id != salon_id {
            return Err(PortError::NotFound(format!("Salon {}", salon_id)));
        }
        Ok(salon)
    }
}

#[async_trait]
impl ServiceCatalog for FakeStore {
    async fn get_service(&self, service_id: Uuid) -> PortResult<ServiceInfo> {
        self.state.calls_to_get_service.fetch_add(1, Ordering::SeqCst);
        let service = self.state.service.lock().unwrap().clone();
        if service.id != service_id {
            return Err(PortError::NotFound(format!("Service {}", service_id)));
        }
        Ok(service)
    }
}

#[async_trait]
impl AppointmentRepository for FakeStore {
    async fn find_by_staff_and_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> PortResult<Vec<Appointment>> {
        self.state.calls_to_find.fetch_add(1, Ordering::SeqCst);
        *self.state.last_range.lock().unwrap() = Some((start, end, statuses.to_vec()));
        self.read_result()?;
        let appointments = self.state.appointments.lock().unwrap();
        Ok(appointments
            .iter()
            .filter(|a| {
                a.staff_id == staff_id
                    && a.date >= start
                    && a.date < end
                    && statuses.contains(&a.status)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewAppointment) -> PortResult<Appointment> {
        self.state.calls_to_create.fetch_add(1, Ordering::SeqCst);
        if self.state.reject_writes.load(Ordering::SeqCst) {
            return Err(PortError::Conflict("exclusion constraint".into()));
        }
        let appointment = Appointment {
            id: Uuid::new_v4(),
            salon_id: new.salon_id,
            staff_id: new.staff_id,
            service_id: new.service_id,
            user_id: new.user_id,
            date: new.date,
            duration_minutes: new.duration_minutes,
            status: new.status,
            notes: new.notes,
            created_at: Utc::now(),
        };
        self.state
            .appointments
            .lock()
            .unwrap()
            .push(appointment.clone());
        Ok(appointment)
    }

    async fn get_by_id(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.state
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Appointment {}", appointment_id)))
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment> {
        let mut appointments = self.state.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| PortError::NotFound(format!("Appointment {}", appointment_id)))?;
        appointment.status = status;
        Ok(appointment.clone())
    }
}
