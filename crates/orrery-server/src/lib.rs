//! HTTP front end for the GitHub publishing flows.
//!
//! Three POST routes run the flows and answer with their JSON outcome, and
//! `GET /health` reports uptime.

mod server;


pub use server::{HealthResponse, PublishServer, PublishService, ServerError};
