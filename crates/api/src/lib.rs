//! SafeAid HTTP API: configuration, middleware, routing, and error mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod rate_limit;
