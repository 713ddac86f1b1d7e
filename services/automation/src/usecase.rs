pub mod advance;
pub mod analytics;
pub mod dispatch;
pub mod enroll;
pub mod events;
pub mod schedule;
pub mod webhook;

#[cfg(test)]
pub mod testsupport;
