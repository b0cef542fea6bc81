//! HTTP surface of the rentals registry.
//!
//! Handlers are thin: they resolve the actor, decode the request and call
//! into `rentals-core`. Every response is wrapped in the JSON envelope from
//! [`envelope`], except history exports which return the rendered file.

pub mod actor;
pub mod envelope;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
