//! Domain types shared across Lexflow services.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; never in `infra/` or `handlers/`.

pub mod action;
pub mod definitions;
pub mod sequence;
pub mod status;
pub mod window;
