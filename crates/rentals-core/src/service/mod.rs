//! Business operations over the repositories.
//!
//! [`PropertyService`] owns every mutation of a property and appends the
//! matching history. [`HistoryService`] answers read-side questions about
//! that history and logs each consultation as an audit record.

pub mod history;
pub mod property;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, MonotonicStamp, SystemClock};
use crate::config::RentalsConfig;
use crate::error::{RentalError, Result};
use crate::model::Property;
use crate::store::{
    HistoryRepository, InMemoryHistoryRepository, InMemoryPropertyRepository, PropertyRepository,
};
use crate::validate::validate_actor;

pub use history::{FieldProvenance, HistoryService};
pub use property::{EventOutcome, PropertyService, UpdateOutcome};

/// Repositories and time source shared by both services.
#[derive(Clone)]
pub struct ServiceContext {
    pub properties: Arc<dyn PropertyRepository>,
    pub history: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
    stamp: Arc<MonotonicStamp>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        history: Arc<dyn HistoryRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            properties,
            history,
            clock,
            stamp: Arc::new(MonotonicStamp::new()),
        }
    }

    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryPropertyRepository::new()),
            Arc::new(InMemoryHistoryRepository::new()),
            clock,
        )
    }

    /// Timestamp for a new record. Strictly later than every earlier one.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.stamp.next(self.clock.now())
    }

    pub(crate) fn require(&self, id: Uuid) -> Result<Property> {
        self.properties
            .get(id)
            .ok_or_else(|| RentalError::NotFound(id.to_string()))
    }
}

pub(crate) fn checked_actor(actor: &str) -> Result<String> {
    validate_actor(actor).map_err(RentalError::invalid)
}

/// Both services wired over one context.
pub struct Rentals {
    pub properties: PropertyService,
    pub history: HistoryService,
}

impl Rentals {
    #[must_use]
    pub fn new(ctx: &ServiceContext, config: &RentalsConfig) -> Self {
        Self {
            properties: PropertyService::new(
                ctx.clone(),
                config.properties.page_limits(),
                config.history.max_records_per_property,
            ),
            history: HistoryService::new(ctx.clone(), config.history.clone()),
        }
    }

    /// In-memory stores on the system clock.
    #[must_use]
    pub fn in_memory(config: &RentalsConfig) -> Self {
        Self::new(&ServiceContext::in_memory(Arc::new(SystemClock)), config)
    }
}
