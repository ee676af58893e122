pub mod protocol;
pub mod rest;
pub mod router;
pub mod state;

// Re-export the handlers and router builder used by the binaries.
pub use rest::{
    availability_handler, create_appointment_handler, get_appointment_handler, health_handler,
    update_status_handler, ApiDoc,
};
pub use router::build_router;
