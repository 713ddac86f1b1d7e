//! The static sequence catalog.
//!
//! Definitions are configuration, not data: they live in code and ship with
//! the binary. Enrollment rows reference them by [`SequenceType`] only.

use std::sync::LazyLock;

use crate::action::ActionTag;
use crate::sequence::{SequenceDefinition, SequenceStep, SequenceType, StepConditions};
use crate::window::SendWindow;

static CATALOG: LazyLock<Vec<SequenceDefinition>> = LazyLock::new(build_catalog);

/// All known sequence definitions.
pub fn catalog() -> &'static [SequenceDefinition] {
    &CATALOG
}

/// Look up one definition by type.
pub fn find(sequence_type: SequenceType) -> Option<&'static SequenceDefinition> {
    CATALOG.iter().find(|d| d.sequence_type == sequence_type)
}

fn step(step_number: u32, delay_hours: i64, subject: &'static str, template_id: &'static str) -> SequenceStep {
    SequenceStep {
        step_number,
        delay_hours,
        subject,
        template_id,
        conditions: None,
        send_window: None,
    }
}

fn skip_if(mut s: SequenceStep, tags: &[ActionTag]) -> SequenceStep {
    s.conditions = Some(StepConditions {
        skip_if: tags.to_vec(),
        only_if: vec![],
    });
    s
}

fn only_if(mut s: SequenceStep, tags: &[ActionTag]) -> SequenceStep {
    s.conditions = Some(StepConditions {
        skip_if: vec![],
        only_if: tags.to_vec(),
    });
    s
}

fn windowed(mut s: SequenceStep, start: &str, end: &str) -> SequenceStep {
    s.send_window = Some(SendWindow::new(
        start.parse().expect("catalog window start"),
        end.parse().expect("catalog window end"),
    ));
    s
}

fn build_catalog() -> Vec<SequenceDefinition> {
    vec![
        SequenceDefinition {
            sequence_type: SequenceType::WelcomeSeries,
            active: true,
            steps: vec![
                step(1, 0, "Welcome to the firm", "welcome-intro"),
                step(2, 48, "How our document packs work", "welcome-documents"),
                step(3, 120, "Meet the team behind your documents", "welcome-team"),
                step(4, 168, "Book a free 15-minute consultation", "welcome-consult"),
            ],
        },
        SequenceDefinition {
            sequence_type: SequenceType::PostPurchase,
            active: true,
            steps: vec![
                step(1, 0, "Your documents are ready", "purchase-receipt"),
                step(2, 72, "Getting the most from your purchase", "purchase-guide"),
                skip_if(
                    step(3, 336, "How did we do?", "purchase-review-ask"),
                    &[ActionTag::HasReviewed],
                ),
            ],
        },
        SequenceDefinition {
            sequence_type: SequenceType::CartAbandonment,
            active: true,
            steps: vec![
                skip_if(
                    step(1, 1, "You left something behind", "cart-nudge"),
                    &[ActionTag::HasPurchased],
                ),
                skip_if(
                    step(2, 24, "Still thinking it over?", "cart-reminder"),
                    &[ActionTag::HasPurchased],
                ),
                skip_if(
                    step(3, 72, "Last chance: your cart expires soon", "cart-final"),
                    &[ActionTag::HasPurchased],
                ),
            ],
        },
        SequenceDefinition {
            sequence_type: SequenceType::BookingReminder,
            active: true,
            steps: vec![
                step(1, -48, "Your consultation is in two days", "booking-48h"),
                step(2, -2, "See you in a couple of hours", "booking-2h"),
            ],
        },
        SequenceDefinition {
            sequence_type: SequenceType::ReEngagement,
            active: true,
            steps: vec![
                step(1, 0, "It's been a while", "reengage-hello"),
                step(2, 168, "What's new at the firm", "reengage-news"),
                only_if(
                    step(3, 336, "A thank-you offer for returning clients", "reengage-offer"),
                    &[ActionTag::HasPurchased],
                ),
            ],
        },
        SequenceDefinition {
            sequence_type: SequenceType::FinancialYearReview,
            active: true,
            steps: vec![
                windowed(
                    step(1, 0, "Time for your annual legal review", "fy-review-invite"),
                    "01-15",
                    "06-30",
                ),
                windowed(
                    step(2, 336, "Annual review: dates are filling up", "fy-review-reminder"),
                    "01-15",
                    "06-30",
                ),
            ],
        },
    ]
}
