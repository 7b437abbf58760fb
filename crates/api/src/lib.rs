//! mediagen API server library.
//!
//! Exposes the building blocks (config, state, auth, error handling, the
//! operation tracker, routes) so integration tests and the binary
//! entrypoint share the same router.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod tracker;
