//! Test utilities for Lexflow services.
//!
//! Provides `MockMailServer` for exercising the HTTP mailer adapters.
//! Import in `#[cfg(test)]` blocks only — never in production code.

pub mod mailer;
