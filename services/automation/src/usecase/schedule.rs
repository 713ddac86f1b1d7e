//! Next-send-time computation shared by enrollment and advancement.

use chrono::{DateTime, Duration, Utc};

use lexflow_domain::sequence::SequenceStep;

/// Key in trigger data carrying the reference time for negative delays.
pub const APPOINTMENT_AT_KEY: &str = "appointment_at";

/// Compute when a step becomes due.
///
/// Positive delays count from `now`. Negative delays mean "before the
/// reference time": when trigger data carries an RFC 3339 `appointment_at`,
/// the delay is applied to it (−48h = two days before the appointment).
/// Without a usable reference the delay still applies to `now`, which makes
/// the step immediately due — better than never sending a reminder.
pub fn next_send_time(
    step: &SequenceStep,
    trigger_data: &serde_json::Value,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let reference = if step.delay_hours < 0 {
        trigger_data
            .get(APPOINTMENT_AT_KEY)
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    } else {
        now
    };
    reference + Duration::hours(step.delay_hours)
}
