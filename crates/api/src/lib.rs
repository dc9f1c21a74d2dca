//! HTTP surface of the note sync server.
//!
//! Config, state, error mapping, routes and the router builder live here so
//! the binary and the integration tests share them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
