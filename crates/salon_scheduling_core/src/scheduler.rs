//! crates/salon_scheduling_core/src/scheduler.rs
//!
//! The two request flows built on top of slot generation and conflict
//! detection: the availability query and the appointment creation guard.
//!
//! Both are advisory reads. Two bookings racing for the same window can both
//! pass the guard, so repositories are expected to enforce an exclusion rule
//! on write and report a violation as `PortError::Conflict`, which surfaces
//! here as `SchedulingError::SlotConflict`.

use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::conflict::ConflictChecker;
use crate::domain::{
    Appointment, AppointmentRequest, AppointmentStatus, Availability, BusyInterval,
    NewAppointment, ServiceInfo,
};
use crate::error::{SchedulingError, SchedulingResult};
use crate::ports::{AppointmentRepository, PortError, SalonHoursProvider, ServiceCatalog};
use crate::slots::SlotGenerator;
use crate::time::{bounded_minutes, day_window};

/// The day an availability query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedDay {
    /// A calendar date, read in the salon's offset.
    Date(NaiveDate),
    /// A timestamp; its calendar date in the salon's offset is used.
    Instant(DateTime<FixedOffset>),
}

impl RequestedDay {
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        match self {
            RequestedDay::Date(date) => *date,
            RequestedDay::Instant(instant) => instant.with_timezone(&offset).date_naive(),
        }
    }
}

/// Maps a lookup miss to a `NotFound` naming what was missing.
fn not_found_as(what: &'static str) -> impl Fn(PortError) -> SchedulingError {
    move |err| match err {
        PortError::NotFound(_) => SchedulingError::NotFound(what.to_string()),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct SchedulingService {
    hours: Arc<dyn SalonHoursProvider>,
    catalog: Arc<dyn ServiceCatalog>,
    appointments: Arc<dyn AppointmentRepository>,
    slots: SlotGenerator,
    checker: ConflictChecker,
}

impl SchedulingService {
    pub fn new(
        hours: Arc<dyn SalonHoursProvider>,
        catalog: Arc<dyn ServiceCatalog>,
        appointments: Arc<dyn AppointmentRepository>,
        slots: SlotGenerator,
        checker: ConflictChecker,
    ) -> Self {
        Self {
            hours,
            catalog,
            appointments,
            slots,
            checker,
        }
    }

    /// Lists the start times at which `staff_id` can perform `service_id` on
    /// the requested day. Pending and confirmed bookings both occupy time.
    pub async fn check_availability(
        &self,
        salon_id: Uuid,
        staff_id: Uuid,
        service_id: Uuid,
        day: RequestedDay,
    ) -> SchedulingResult<Availability> {
        let salon = self
            .hours
            .get_hours(salon_id)
            .await
            .map_err(not_found_as("Salon"))?;
        let date = day.local_date(salon.utc_offset);
        let service = self.service(service_id).await?;
        let hours = *salon.for_weekday(date.weekday()).ok_or_else(|| {
            SchedulingError::NotFound(format!("Operating hours for {}", date.weekday()))
        })?;

        let (day_start, day_end) = day_window(date, salon.utc_offset);
        let booked = self
            .appointments
            .find_by_staff_and_range(staff_id, day_start, day_end, &AppointmentStatus::BLOCKING)
            .await?;
        let busy: Vec<BusyInterval> = booked.iter().map(Appointment::busy_interval).collect();

        let day_slots = self.slots.generate(
            date,
            &hours,
            salon.utc_offset,
            service.duration_minutes,
            &busy,
        )?;
        debug!(
            %salon_id,
            %staff_id,
            %date,
            closed = day_slots.is_closed(),
            free = day_slots.starts().len(),
            "availability computed"
        );

        Ok(Availability {
            date,
            utc_offset: salon.utc_offset,
            closed: day_slots.is_closed(),
            slots: day_slots.starts().to_vec(),
            service_duration: service.duration_minutes,
        })
    }

    /// Books an appointment after checking the staff member's confirmed
    /// bookings for a collision. The duration always comes from the catalog.
    pub async fn create_appointment(
        &self,
        request: AppointmentRequest,
    ) -> SchedulingResult<Appointment> {
        let service = self.service(request.service_id).await?;
        let duration = bounded_minutes(service.duration_minutes, "service duration")?;
        let end = request.date + duration;

        self.ensure_free(request.staff_id, request.date, end, None)
            .await?;

        let appointment = self
            .appointments
            .create(NewAppointment {
                salon_id: request.salon_id,
                staff_id: request.staff_id,
                service_id: request.service_id,
                user_id: request.user_id,
                date: request.date,
                duration_minutes: service.duration_minutes,
                status: request.status.unwrap_or(AppointmentStatus::Pending),
                notes: request.notes,
            })
            .await?;
        info!(
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            date = %appointment.date,
            "appointment created"
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> SchedulingResult<Appointment> {
        self.appointments
            .get_by_id(appointment_id)
            .await
            .map_err(not_found_as("Appointment"))
    }

    /// Changes an appointment's status. Confirming re-runs the creation guard
    /// against the staff member's other confirmed bookings.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> SchedulingResult<Appointment> {
        let current = self.get_appointment(appointment_id).await?;
        if status == AppointmentStatus::Confirmed && current.status != AppointmentStatus::Confirmed
        {
            self.ensure_free(current.staff_id, current.date, current.end(), Some(current.id))
                .await?;
        }
        let updated = self
            .appointments
            .update_status(appointment_id, status)
            .await
            .map_err(not_found_as("Appointment"))?;
        info!(%appointment_id, from = %current.status, to = %status, "appointment status changed");
        Ok(updated)
    }

    async fn service(&self, service_id: Uuid) -> SchedulingResult<ServiceInfo> {
        self.catalog
            .get_service(service_id)
            .await
            .map_err(not_found_as("Service"))
    }

    async fn ensure_free(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        ignore: Option<Uuid>,
    ) -> SchedulingResult<()> {
        let (from, to) = self.checker.lookup_window(start, end);
        let confirmed = self
            .appointments
            .find_by_staff_and_range(staff_id, from, to, &[AppointmentStatus::Confirmed])
            .await?;
        if let Some(existing) = self
            .checker
            .find_conflict(staff_id, start, end, &confirmed, ignore)
        {
            warn!(
                %staff_id,
                candidate_start = %start,
                existing_id = %existing.id,
                existing_start = %existing.date,
                "time slot not available"
            );
            return Err(SchedulingError::SlotConflict);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::OverlapRule;
    use crate::testutils::{FakeStore, DEFAULT_DURATION};
    use chrono::{Duration, TimeZone, Timelike, Weekday};
    use std::sync::atomic::Ordering;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    fn service_with(store: &FakeStore, rule: OverlapRule) -> SchedulingService {
        SchedulingService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            SlotGenerator::new(30).unwrap(),
            ConflictChecker::new(rule),
        )
    }

    fn service(store: &FakeStore) -> SchedulingService {
        service_with(store, OverlapRule::HalfOpenOverlap)
    }

    fn request(store: &FakeStore, start: DateTime<Utc>) -> AppointmentRequest {
        AppointmentRequest {
            user_id: Uuid::new_v4(),
            salon_id: store.salon_id,
            service_id: store.service_id,
            staff_id: store.staff_id,
            date: start,
            status: None,
            notes: Some("first visit".to_string()),
        }
    }

    fn hhmm(slots: &[DateTime<Utc>]) -> Vec<String> {
        slots
            .iter()
            .map(|t| format!("{:02}:{:02}", t.hour(), t.minute()))
            .collect()
    }

    #[tokio::test]
    async fn availability_excludes_touched_slots() {
        let store = FakeStore::new();
        store.set_hours(Weekday::Mon, "09:00", "12:00");
        store.set_duration(60);
        store.add_booking(at(9, 30), 60, AppointmentStatus::Confirmed);

        let availability = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap();

        assert!(availability.available());
        assert!(!availability.closed);
        assert_eq!(availability.service_duration, 60);
        assert_eq!(hhmm(&availability.slots), vec!["10:30", "11:00"]);
    }

    #[tokio::test]
    async fn availability_queries_the_local_day_for_blocking_statuses() {
        let store = FakeStore::new();
        service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap();

        let (start, end, statuses) = store.state.last_range.lock().unwrap().clone().unwrap();
        assert_eq!(start, at(0, 0));
        assert_eq!(end, at(0, 0) + Duration::days(1));
        assert_eq!(statuses, AppointmentStatus::BLOCKING.to_vec());
    }

    #[tokio::test]
    async fn pending_bookings_block_but_cancelled_do_not() {
        let store = FakeStore::new();
        store.set_hours(Weekday::Mon, "09:00", "10:30");
        store.add_booking(at(9, 0), 30, AppointmentStatus::Pending);
        store.add_booking(at(10, 0), 30, AppointmentStatus::Cancelled);

        let availability = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap();
        assert_eq!(hhmm(&availability.slots), vec!["09:30", "10:00"]);
    }

    #[tokio::test]
    async fn closed_day_is_distinguished_from_fully_booked() {
        let store = FakeStore::new();
        store.set_closed(Weekday::Mon);

        let availability = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap();
        assert!(availability.closed);
        assert!(!availability.available());
    }

    #[tokio::test]
    async fn fully_booked_day_is_open_but_unavailable() {
        let store = FakeStore::new();
        store.set_hours(Weekday::Mon, "09:00", "10:00");
        store.add_booking(at(9, 0), 60, AppointmentStatus::Confirmed);

        let availability = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap();
        assert!(!availability.closed);
        assert!(!availability.available());
    }

    #[tokio::test]
    async fn unknown_salon_is_not_found() {
        let store = FakeStore::new();
        let err = service(&store)
            .check_availability(
                Uuid::new_v4(),
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(ref what) if what == "Salon"));
        assert_eq!(store.state.calls_to_get_hours.load(Ordering::SeqCst), 1);
        assert_eq!(store.state.calls_to_get_service.load(Ordering::SeqCst), 0);
        assert_eq!(store.state.calls_to_find.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let store = FakeStore::new();
        let err = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                Uuid::new_v4(),
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(ref what) if what == "Service"));
        assert_eq!(store.state.calls_to_get_service.load(Ordering::SeqCst), 1);
        assert_eq!(store.state.calls_to_find.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_service_is_reported_before_missing_weekday() {
        let store = FakeStore::new();
        store.state.salon.lock().unwrap().weekly.remove(&Weekday::Mon);
        let err = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                Uuid::new_v4(),
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(ref what) if what == "Service"));
    }

    #[tokio::test]
    async fn missing_weekday_is_not_assumed_open() {
        let store = FakeStore::new();
        store.state.salon.lock().unwrap().weekly.remove(&Weekday::Mon);
        let err = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(_)));
    }

    #[tokio::test]
    async fn repository_failure_is_propagated() {
        let store = FakeStore::new();
        store.state.fail_reads.store(true, Ordering::SeqCst);
        let err = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Date(monday()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::Upstream(_)));
        assert_eq!(store.state.calls_to_find.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn instant_is_read_as_salon_local_date() {
        let store = FakeStore::new();
        store.set_offset_hours(-5);
        // 02:00 UTC on Tuesday is still Monday evening at UTC-5.
        let instant = Utc
            .with_ymd_and_hms(2024, 3, 5, 2, 0, 0)
            .unwrap()
            .fixed_offset();
        let availability = service(&store)
            .check_availability(
                store.salon_id,
                store.staff_id,
                store.service_id,
                RequestedDay::Instant(instant),
            )
            .await
            .unwrap();
        assert_eq!(availability.date, monday());
        assert_eq!(availability.slots.first(), Some(&at(14, 0)));
    }

    #[tokio::test]
    async fn overlapping_confirmed_booking_rejects_creation() {
        let store = FakeStore::new();
        store.add_booking(at(10, 15), 30, AppointmentStatus::Confirmed);

        let err = service(&store)
            .create_appointment(request(&store, at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::SlotConflict));
        assert_eq!(err.to_string(), "This time slot is not available");
        assert_eq!(store.state.calls_to_create.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn creation_copies_duration_and_defaults_to_pending() {
        let store = FakeStore::new();
        store.set_duration(45);

        let appointment = service(&store)
            .create_appointment(request(&store, at(10, 0)))
            .await
            .unwrap();
        assert_eq!(appointment.duration_minutes, 45);
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.notes.as_deref(), Some("first visit"));
        assert_eq!(store.state.calls_to_create.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pending_bookings_do_not_block_creation() {
        let store = FakeStore::new();
        store.add_booking(at(10, 0), DEFAULT_DURATION, AppointmentStatus::Pending);

        let result = service(&store)
            .create_appointment(request(&store, at(10, 0)))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn narrow_rule_misses_bookings_started_earlier() {
        let store = FakeStore::new();
        store.add_booking(at(9, 45), 30, AppointmentStatus::Confirmed);

        let narrow = service_with(&store, OverlapRule::StartWithinWindow)
            .create_appointment(request(&store, at(10, 0)))
            .await;
        assert!(narrow.is_ok());

        let full = service(&store)
            .create_appointment(request(&store, at(10, 0)))
            .await;
        assert!(matches!(full, Err(SchedulingError::SlotConflict)));
    }

    #[tokio::test]
    async fn storage_exclusion_is_reported_as_conflict() {
        let store = FakeStore::new();
        store.state.reject_writes.store(true, Ordering::SeqCst);

        let err = service(&store)
            .create_appointment(request(&store, at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::SlotConflict));
    }

    #[tokio::test]
    async fn creation_with_unknown_service_is_not_found() {
        let store = FakeStore::new();
        let mut req = request(&store, at(10, 0));
        req.service_id = Uuid::new_v4();
        let err = service(&store).create_appointment(req).await.unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(ref what) if what == "Service"));
    }

    #[tokio::test]
    async fn confirming_into_a_taken_window_conflicts() {
        let store = FakeStore::new();
        store.add_booking(at(10, 0), 30, AppointmentStatus::Confirmed);
        let pending = store.add_booking(at(10, 15), 30, AppointmentStatus::Pending);

        let scheduler = service(&store);
        let err = scheduler
            .update_status(pending, AppointmentStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::SlotConflict));

        let cancelled = scheduler
            .update_status(pending, AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn reconfirming_does_not_conflict_with_itself() {
        let store = FakeStore::new();
        let confirmed = store.add_booking(at(10, 0), 30, AppointmentStatus::Confirmed);
        let updated = service(&store)
            .update_status(confirmed, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.id, confirmed);
    }

    #[tokio::test]
    async fn unknown_appointment_is_not_found() {
        let store = FakeStore::new();
        let err = service(&store)
            .get_appointment(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound(ref what) if what == "Appointment"));
    }
}
