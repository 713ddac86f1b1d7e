//! Subscriber action tags consulted by step conditions.

use serde::{Deserialize, Serialize};

/// A recorded subject action, used as a membership test by `skip_if` /
/// `only_if` step conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    HasPurchased,
    HasBooked,
    HasReviewed,
    HasSubscribed,
}

impl ActionTag {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::HasPurchased => 0,
            Self::HasBooked => 1,
            Self::HasReviewed => 2,
            Self::HasSubscribed => 3,
        }
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::HasPurchased),
            1 => Some(Self::HasBooked),
            2 => Some(Self::HasReviewed),
            3 => Some(Self::HasSubscribed),
            _ => None,
        }
    }
}
