//! HTTP API: configuration, routing, and request/response mapping for the
//! gatekeeper.

pub mod app;
pub mod config;
