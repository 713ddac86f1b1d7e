//! Sea-ORM entities for the automation service.

pub mod sequence_enrollments;
pub mod sequence_events;
pub mod subscriber_actions;
pub mod webhook_events;
