//! HTTP surface of the stock engine.
//!
//! Thin layer: request parsing, JWT validation, permission checks, and error
//! mapping. All decisions live in the domain crates and `tapline-infra`.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
