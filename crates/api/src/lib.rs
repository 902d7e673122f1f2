//! HTTP API: routing, authentication middleware and response shaping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod dev_seed;
pub mod envelope;
pub mod fault;
pub mod middleware;
