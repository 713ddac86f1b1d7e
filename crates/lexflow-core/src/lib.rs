//! Ambient plumbing shared by Lexflow services: configuration loading,
//! health endpoints, tracing setup, request-id middleware, and serde helpers.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
