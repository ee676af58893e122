//! services/api/src/web/state.rs
//!
//! Defines the application state shared by all handlers.

use std::sync::Arc;

use salon_scheduling_core::{
    AppointmentRepository, ConflictChecker, SalonHoursProvider, SchedulingResult,
    SchedulingService, ServiceCatalog, SlotGenerator,
};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: SchedulingService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the scheduling core to its collaborators using the configured
    /// slot granularity and conflict rule.
    pub fn new(
        config: Arc<Config>,
        hours: Arc<dyn SalonHoursProvider>,
        catalog: Arc<dyn ServiceCatalog>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> SchedulingResult<Self> {
        let slots = SlotGenerator::new(config.slot_granularity_minutes)?;
        let checker = ConflictChecker::new(config.conflict_rule);
        Ok(Self {
            scheduler: SchedulingService::new(hours, catalog, appointments, slots, checker),
            config,
        })
    }
}
