//! Retention action recommendations.
//!
//! Order is fixed: the tier block first, then the declining-value hint,
//! then the premium hint.

use crate::scoring::{RiskAssessment, RiskTier, Trend};

const CRITICAL_ACTIONS: &[&str] = &[
    "Urgent: personal WhatsApp outreach from the manager",
    "Win-back offer: 30% off the next visit",
    "VIP invitation to the next event",
];

const HIGH_ACTIONS: &[&str] = &[
    "Re-engagement campaign with a 20-25% coupon",
    "Invite to upcoming special events",
];

const MEDIUM_ACTIONS: &[&str] = &[
    "Preventive touchpoint: share this month's programme",
    "Loyalty reward on the next visit",
];

pub const DECLINING_VALUE_HINT: &str =
    "Spend is declining: offer a combo or upgrade to lift the ticket";

pub const PREMIUM_HINT: &str =
    "High-value customer: premium treatment and exclusive benefits";

/// The fixed action block for a tier. Low risk needs no intervention.
pub fn tier_actions(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::Critical => CRITICAL_ACTIONS,
        RiskTier::High     => HIGH_ACTIONS,
        RiskTier::Medium   => MEDIUM_ACTIONS,
        RiskTier::Low      => &[],
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionRecommender {
    premium_ticket_threshold: f64,
}

impl ActionRecommender {
    pub fn new(premium_ticket_threshold: f64) -> Self {
        Self { premium_ticket_threshold }
    }

    pub fn recommend(&self, assessment: &RiskAssessment) -> Vec<String> {
        let mut actions: Vec<String> = tier_actions(assessment.tier)
            .iter()
            .map(|a| a.to_string())
            .collect();

        if assessment.value_trend == Trend::Falling {
            actions.push(DECLINING_VALUE_HINT.to_string());
        }
        if assessment.average_ticket > self.premium_ticket_threshold {
            actions.push(PREMIUM_HINT.to_string());
        }

        actions
    }
}
