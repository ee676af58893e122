//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, NaiveDate, Utc};
use salon_scheduling_core::{AppointmentRequest, RequestedDay, SchedulingError};
use tracing::{error, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::web::protocol::{
    AppointmentResponse, AppointmentStatusDto, AvailabilityQuery, AvailabilityResponse,
    CreateAppointmentRequest, ErrorResponse, HealthResponse, TimeSlotResponse,
    UpdateStatusRequest,
};
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        availability_handler,
        create_appointment_handler,
        get_appointment_handler,
        update_status_handler,
    ),
    components(
        schemas(
            AvailabilityResponse,
            TimeSlotResponse,
            CreateAppointmentRequest,
            UpdateStatusRequest,
            AppointmentResponse,
            AppointmentStatusDto,
            ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "Salon Scheduling API", description = "Availability and booking endpoints for salon appointments.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

type ApiFailure = (StatusCode, Json<ErrorResponse>);

fn failure(status: StatusCode, message: impl Into<String>) -> ApiFailure {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
        }),
    )
}

/// Maps the scheduling error taxonomy onto HTTP status codes.
fn scheduling_failure(err: SchedulingError) -> ApiFailure {
    match err {
        SchedulingError::NotFound(_) => failure(StatusCode::NOT_FOUND, err.to_string()),
        SchedulingError::InvalidInput(_) => failure(StatusCode::BAD_REQUEST, err.to_string()),
        SchedulingError::SlotConflict => failure(StatusCode::CONFLICT, err.to_string()),
        SchedulingError::Upstream(ref detail) => {
            error!("Collaborator query failed: {}", detail);
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn json_failure(rejection: JsonRejection) -> ApiFailure {
    warn!("Rejected request body: {}", rejection.body_text());
    failure(StatusCode::BAD_REQUEST, rejection.body_text())
}

fn path_failure(rejection: PathRejection) -> ApiFailure {
    warn!("Rejected request path: {}", rejection.body_text());
    failure(StatusCode::BAD_REQUEST, "Invalid appointment id format")
}

fn parse_id(name: &str, value: &str) -> Result<Uuid, ApiFailure> {
    Uuid::parse_str(value)
        .map_err(|_| failure(StatusCode::BAD_REQUEST, format!("Invalid {} format", name)))
}

fn parse_day(value: &str) -> Result<RequestedDay, ApiFailure> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(RequestedDay::Date(date));
    }
    DateTime::parse_from_rfc3339(value)
        .map(RequestedDay::Instant)
        .map_err(|_| {
            failure(
                StatusCode::BAD_REQUEST,
                "date must be YYYY-MM-DD or an ISO 8601 timestamp",
            )
        })
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// List the bookable start times of a staff member for a service on one day.
#[utoipa::path(
    get,
    path = "/appointments/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots computed", body = AvailabilityResponse),
        (status = 400, description = "Missing or malformed query parameters", body = ErrorResponse),
        (status = 404, description = "Salon or service not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn availability_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiFailure> {
    let (Some(salon_id), Some(staff_id), Some(service_id), Some(date)) =
        (query.salon_id, query.staff_id, query.service_id, query.date)
    else {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            "salonId, staffId, serviceId and date are required",
        ));
    };
    let salon_id = parse_id("salonId", &salon_id)?;
    let staff_id = parse_id("staffId", &staff_id)?;
    let service_id = parse_id("serviceId", &service_id)?;
    let day = parse_day(&date)?;

    let availability = app_state
        .scheduler
        .check_availability(salon_id, staff_id, service_id, day)
        .await
        .map_err(scheduling_failure)?;
    Ok(Json(availability.into()))
}

/// Book an appointment. The slot is re-checked against confirmed bookings.
#[utoipa::path(
    post,
    path = "/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = AppointmentResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Service not found", body = ErrorResponse),
        (status = 409, description = "This time slot is not available", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_appointment_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiFailure> {
    let Json(req) = payload.map_err(json_failure)?;
    let request = AppointmentRequest {
        user_id: req.user_id,
        salon_id: req.salon_id,
        service_id: req.service_id,
        staff_id: req.staff_id,
        date: req.date.with_timezone(&Utc),
        status: req.status.map(Into::into),
        notes: req.notes,
    };

    let appointment = app_state
        .scheduler
        .create_appointment(request)
        .await
        .map_err(scheduling_failure)?;
    Ok((StatusCode::CREATED, Json(AppointmentResponse::from(appointment))))
}

/// Fetch one appointment.
#[utoipa::path(
    get,
    path = "/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment found", body = AppointmentResponse),
        (status = 400, description = "Malformed appointment id", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    )
)]
pub async fn get_appointment_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AppointmentResponse>, ApiFailure> {
    let Path(appointment_id) = path.map_err(path_failure)?;
    let appointment = app_state
        .scheduler
        .get_appointment(appointment_id)
        .await
        .map_err(scheduling_failure)?;
    Ok(Json(appointment.into()))
}

/// Change the status of an appointment. Confirming re-checks the slot.
#[utoipa::path(
    patch,
    path = "/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = AppointmentResponse),
        (status = 400, description = "Malformed appointment id or request body", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse),
        (status = 409, description = "This time slot is not available", body = ErrorResponse)
    )
)]
pub async fn update_status_handler(
    State(app_state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<AppointmentResponse>, ApiFailure> {
    let Path(appointment_id) = path.map_err(path_failure)?;
    let Json(req) = payload.map_err(json_failure)?;
    let appointment = app_state
        .scheduler
        .update_status(appointment_id, req.status.into())
        .await
        .map_err(scheduling_failure)?;
    Ok(Json(appointment.into()))
}
