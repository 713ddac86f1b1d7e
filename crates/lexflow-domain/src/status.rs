//! Status enums with stable i16 database codes.

use serde::{Deserialize, Serialize};

/// Lifecycle of a sequence enrollment.
///
/// `Completed` and `Cancelled` are terminal; no transition leaves them.
/// `Paused` is reserved for manual administrative pause/resume and is never
/// entered by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Active => 0,
            Self::Paused => 1,
            Self::Completed => 2,
            Self::Cancelled => 3,
        }
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Active),
            1 => Some(Self::Paused),
            2 => Some(Self::Completed),
            3 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// True for `Completed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Append-only engagement event kinds recorded against an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceEventType {
    Sent,
    Opened,
    Clicked,
    Bounced,
    Unsubscribed,
}

impl SequenceEventType {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Sent => 0,
            Self::Opened => 1,
            Self::Clicked => 2,
            Self::Bounced => 3,
            Self::Unsubscribed => 4,
        }
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Sent),
            1 => Some(Self::Opened),
            2 => Some(Self::Clicked),
            3 => Some(Self::Bounced),
            4 => Some(Self::Unsubscribed),
            _ => None,
        }
    }
}

/// Lifecycle of a webhook event row in the idempotency gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    Processing,
    Processed,
    Failed,
}

impl WebhookStatus {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Processing => 0,
            Self::Processed => 1,
            Self::Failed => 2,
        }
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Processing),
            1 => Some(Self::Processed),
            2 => Some(Self::Failed),
            _ => None,
        }
    }
}
