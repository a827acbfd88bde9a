//! HTTP API: configuration, server wiring, and request handlers.

pub mod app;
pub mod authz;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod middleware;
pub mod seed;
