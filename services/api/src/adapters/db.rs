//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the collaborator ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc, Weekday};
use salon_scheduling_core::domain::{
    Appointment, AppointmentStatus, NewAppointment, OperatingHours, SalonHours, ServiceInfo,
};
use salon_scheduling_core::ports::{
    AppointmentRepository, PortError, PortResult, SalonHoursProvider, ServiceCatalog,
};
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

/// SQLSTATE for `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

const APPOINTMENT_COLUMNS: &str =
    "id, salon_id, staff_id, service_id, user_id, date, duration, status, notes, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the salon, catalog and appointment ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a failed write, turning the overlap constraint into a conflict.
fn write_error(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &e {
        if matches!(
            db_err.code().as_deref(),
            Some(EXCLUSION_VIOLATION) | Some(UNIQUE_VIOLATION)
        ) {
            return PortError::Conflict(db_err.message().to_string());
        }
    }
    unexpected(e)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

/// One weekday entry of the `business_hours` JSON column.
#[derive(Debug, Deserialize)]
struct DayHoursRecord {
    #[serde(default)]
    open: String,
    #[serde(default)]
    close: String,
    #[serde(default)]
    closed: bool,
}

#[derive(FromRow)]
struct SalonRecord {
    id: Uuid,
    utc_offset_minutes: i32,
    business_hours: Json<HashMap<String, DayHoursRecord>>,
}
impl SalonRecord {
    fn to_domain(self) -> PortResult<SalonHours> {
        let utc_offset = self
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                PortError::Unexpected(format!(
                    "Salon {} has an invalid UTC offset of {} minutes",
                    self.id, self.utc_offset_minutes
                ))
            })?;

        let mut weekly = HashMap::new();
        for (day, record) in self.business_hours.0 {
            let weekday = day.parse::<Weekday>().map_err(|_| {
                PortError::Unexpected(format!("Salon {} has an unknown weekday '{}'", self.id, day))
            })?;
            let hours = OperatingHours::parse(&record.open, &record.close, record.closed)
                .map_err(|e| {
                    PortError::Unexpected(format!("Salon {} {}: {}", self.id, day, e))
                })?;
            weekly.insert(weekday, hours);
        }

        Ok(SalonHours {
            salon_id: self.id,
            utc_offset,
            weekly,
        })
    }
}

#[derive(FromRow)]
struct ServiceRecord {
    id: Uuid,
    duration: i32,
    price: f64,
}
impl ServiceRecord {
    fn to_domain(self) -> ServiceInfo {
        ServiceInfo {
            id: self.id,
            duration_minutes: i64::from(self.duration),
            price: self.price,
        }
    }
}

#[derive(FromRow)]
struct AppointmentRecord {
    id: Uuid,
    salon_id: Uuid,
    staff_id: Uuid,
    service_id: Uuid,
    user_id: Uuid,
    date: DateTime<Utc>,
    duration: i32,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}
impl AppointmentRecord {
    fn to_domain(self) -> PortResult<Appointment> {
        let status = self.status.parse::<AppointmentStatus>().map_err(|e| {
            PortError::Unexpected(format!("Appointment {}: {}", self.id, e))
        })?;
        Ok(Appointment {
            id: self.id,
            salon_id: self.salon_id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            user_id: self.user_id,
            date: self.date,
            duration_minutes: i64::from(self.duration),
            status,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl SalonHoursProvider for DbAdapter {
    async fn get_hours(&self, salon_id: Uuid) -> PortResult<SalonHours> {
        let record = sqlx::query_as::<_, SalonRecord>(
            "SELECT id, utc_offset_minutes, business_hours FROM salons WHERE id = $1",
        )
        .bind(salon_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Salon {} not found", salon_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }
}

#[async_trait]
impl ServiceCatalog for DbAdapter {
    async fn get_service(&self, service_id: Uuid) -> PortResult<ServiceInfo> {
        let record = sqlx::query_as::<_, ServiceRecord>(
            "SELECT id, duration, price FROM services WHERE id = $1",
        )
        .bind(service_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Service {} not found", service_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl AppointmentRepository for DbAdapter {
    async fn find_by_staff_and_range(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[AppointmentStatus],
    ) -> PortResult<Vec<Appointment>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE staff_id = $1 AND date >= $2 AND date < $3 AND status = ANY($4) \
             ORDER BY date ASC"
        );
        let records = sqlx::query_as::<_, AppointmentRecord>(&query)
            .bind(staff_id)
            .bind(start)
            .bind(end)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(AppointmentRecord::to_domain).collect()
    }

    async fn create(&self, appointment: NewAppointment) -> PortResult<Appointment> {
        let duration = i32::try_from(appointment.duration_minutes).map_err(|_| {
            PortError::Unexpected(format!(
                "duration of {} minutes does not fit the appointments table",
                appointment.duration_minutes
            ))
        })?;
        let ends_at = appointment.date + Duration::minutes(appointment.duration_minutes);
        let query = format!(
            "INSERT INTO appointments \
             (id, salon_id, staff_id, service_id, user_id, date, duration, ends_at, status, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {APPOINTMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AppointmentRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(appointment.salon_id)
            .bind(appointment.staff_id)
            .bind(appointment.service_id)
            .bind(appointment.user_id)
            .bind(appointment.date)
            .bind(duration)
            .bind(ends_at)
            .bind(appointment.status.as_str())
            .bind(appointment.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(write_error)?;
        record.to_domain()
    }

    async fn get_by_id(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        let query = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        let record = sqlx::query_as::<_, AppointmentRecord>(&query)
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))?;
        record.to_domain()
    }

    async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> PortResult<Appointment> {
        let query = format!(
            "UPDATE appointments SET status = $1 WHERE id = $2 RETURNING {APPOINTMENT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, AppointmentRecord>(&query)
            .bind(status.as_str())
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(write_error)?
            .ok_or_else(|| PortError::NotFound(format!("Appointment {} not found", appointment_id)))?;
        record.to_domain()
    }
}
