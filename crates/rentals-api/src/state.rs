use std::sync::Arc;

use rentals_core::Rentals;
use rentals_core::config::RentalsConfig;

/// Shared handler state: both services behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub rentals: Arc<Rentals>,
}

impl AppState {
    #[must_use]
    pub fn new(rentals: Rentals) -> Self {
        Self {
            rentals: Arc::new(rentals),
        }
    }

    /// Fresh in-memory stores on the system clock.
    #[must_use]
    pub fn in_memory(config: &RentalsConfig) -> Self {
        Self::new(Rentals::in_memory(config))
    }
}
