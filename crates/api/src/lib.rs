//! SmartWay API server library.
//!
//! Exposes config, state, error handling, routes and the shared router
//! builder so integration tests and the binary entrypoint use the same
//! pieces.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
