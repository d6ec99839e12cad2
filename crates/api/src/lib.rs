//! Reference dashboard service for the lineage canvas editor.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! authentication) so integration tests, the client crate's end-to-end
//! tests, and the binary entrypoint can all assemble the same router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
