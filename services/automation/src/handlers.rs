pub mod analytics;
pub mod dispatch;
pub mod enrollment;
pub mod events;
pub mod webhook;
