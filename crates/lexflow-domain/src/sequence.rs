//! Sequence types and step definitions.

use serde::{Deserialize, Serialize};

use crate::action::ActionTag;
use crate::window::SendWindow;

/// The named drip campaigns the automation service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    WelcomeSeries,
    PostPurchase,
    CartAbandonment,
    BookingReminder,
    ReEngagement,
    FinancialYearReview,
}

impl SequenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WelcomeSeries => "welcome_series",
            Self::PostPurchase => "post_purchase",
            Self::CartAbandonment => "cart_abandonment",
            Self::BookingReminder => "booking_reminder",
            Self::ReEngagement => "re_engagement",
            Self::FinancialYearReview => "financial_year_review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "welcome_series" => Some(Self::WelcomeSeries),
            "post_purchase" => Some(Self::PostPurchase),
            "cart_abandonment" => Some(Self::CartAbandonment),
            "booking_reminder" => Some(Self::BookingReminder),
            "re_engagement" => Some(Self::ReEngagement),
            "financial_year_review" => Some(Self::FinancialYearReview),
            _ => None,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            Self::WelcomeSeries => 0,
            Self::PostPurchase => 1,
            Self::CartAbandonment => 2,
            Self::BookingReminder => 3,
            Self::ReEngagement => 4,
            Self::FinancialYearReview => 5,
        }
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::WelcomeSeries),
            1 => Some(Self::PostPurchase),
            2 => Some(Self::CartAbandonment),
            3 => Some(Self::BookingReminder),
            4 => Some(Self::ReEngagement),
            5 => Some(Self::FinancialYearReview),
            _ => None,
        }
    }
}

/// Conditional gating for one step, evaluated against the subject's
/// recorded action tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConditions {
    /// Skip (advance without sending) if the subject has performed any of
    /// these actions.
    #[serde(default)]
    pub skip_if: Vec<ActionTag>,
    /// Skip unless the subject has performed at least one of these actions.
    #[serde(default)]
    pub only_if: Vec<ActionTag>,
}

impl StepConditions {
    /// Whether the step should be bypassed for a subject with the given
    /// recorded actions.
    pub fn should_skip(&self, actions: &std::collections::HashSet<ActionTag>) -> bool {
        if self.skip_if.iter().any(|tag| actions.contains(tag)) {
            return true;
        }
        if !self.only_if.is_empty() && !self.only_if.iter().any(|tag| actions.contains(tag)) {
            return true;
        }
        false
    }
}

/// One timed email in a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceStep {
    /// 1-based, strictly increasing and contiguous within a definition.
    pub step_number: u32,
    /// Hours after the reference time. Negative means "before" — used for
    /// pre-appointment reminders where the reference is the appointment
    /// time carried in trigger data.
    pub delay_hours: i64,
    pub subject: &'static str,
    pub template_id: &'static str,
    pub conditions: Option<StepConditions>,
    pub send_window: Option<SendWindow>,
}

/// A complete, immutable sequence definition.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceDefinition {
    pub sequence_type: SequenceType,
    pub active: bool,
    pub steps: Vec<SequenceStep>,
}

impl SequenceDefinition {
    /// Look up a step by its 1-based number.
    pub fn step(&self, step_number: u32) -> Option<&SequenceStep> {
        self.steps.iter().find(|s| s.step_number == step_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn should_round_trip_sequence_type() {
        for ty in [
            SequenceType::WelcomeSeries,
            SequenceType::PostPurchase,
            SequenceType::CartAbandonment,
            SequenceType::BookingReminder,
            SequenceType::ReEngagement,
            SequenceType::FinancialYearReview,
        ] {
            assert_eq!(SequenceType::parse(ty.as_str()), Some(ty));
            assert_eq!(SequenceType::from_i16(ty.as_i16()), Some(ty));
        }
        assert_eq!(SequenceType::parse("holiday_special"), None);
    }

    #[test]
    fn should_skip_when_skip_if_action_recorded() {
        let conditions = StepConditions {
            skip_if: vec![ActionTag::HasPurchased],
            only_if: vec![],
        };
        let actions = HashSet::from([ActionTag::HasPurchased]);
        assert!(conditions.should_skip(&actions));
        assert!(!conditions.should_skip(&HashSet::new()));
    }

    #[test]
    fn should_skip_when_only_if_action_missing() {
        let conditions = StepConditions {
            skip_if: vec![],
            only_if: vec![ActionTag::HasPurchased],
        };
        assert!(conditions.should_skip(&HashSet::new()));
        assert!(!conditions.should_skip(&HashSet::from([ActionTag::HasPurchased])));
    }

    #[test]
    fn should_not_skip_with_empty_conditions() {
        let conditions = StepConditions::default();
        assert!(!conditions.should_skip(&HashSet::from([ActionTag::HasBooked])));
    }
}
