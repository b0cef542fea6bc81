//! rentals-core library.
//!
//! Property registry and append-only history for a rental management
//! backend. The HTTP surface lives in `rentals-api`.
//!
//! # Conventions
//!
//! - **Errors**: services return [`error::Result`] with a [`error::RentalError`]
//!   carrying a stable `E####` code. Config loading uses `anyhow::Result`.
//! - **Logging**: `tracing` macros. `info!` on mutations, `debug!` on reads,
//!   `warn!` on rejected business rules.
//! - **Time**: every timestamp comes from a [`clock::Clock`] so tests can pin it.

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod request;
pub mod sequence;
pub mod service;
pub mod store;
pub mod validate;

pub use error::{ErrorCode, RentalError, Result};
pub use service::{HistoryService, PropertyService, Rentals, ServiceContext};
