//! Action recommendations: tier block first, then trend and value hints.

mod common;

use common::date;
use retention_core::{
    actions::{tier_actions, ActionRecommender, DECLINING_VALUE_HINT, PREMIUM_HINT},
    scoring::{RiskAssessment, RiskTier, ScoreComponents, Trend},
};

fn assessment(tier: RiskTier, value_trend: Trend, average_ticket: f64) -> RiskAssessment {
    RiskAssessment {
        canonical_key: "11933334444".into(),
        display_name: "Ana Souza".into(),
        last_visit: date("2025-01-01"),
        recency_days: 30,
        visits_30d: 0,
        visits_30_60d: 2,
        spend_30d: 0.0,
        spend_30_60d: 200.0,
        total_visits: 4,
        total_spend: average_ticket * 4.0,
        average_ticket,
        frequency_delta_pct: -100.0,
        value_delta_pct: -100.0,
        frequency_trend: Trend::Falling,
        value_trend,
        components: ScoreComponents::default(),
        score: 0,
        tier,
        suggested_actions: Vec::new(),
    }
}

#[test]
fn every_risk_tier_but_low_has_a_block() {
    assert!(!tier_actions(RiskTier::Critical).is_empty());
    assert!(!tier_actions(RiskTier::High).is_empty());
    assert!(!tier_actions(RiskTier::Medium).is_empty());
    assert!(tier_actions(RiskTier::Low).is_empty());
}

#[test]
fn tier_block_comes_before_hints() {
    let rec = ActionRecommender::new(150.0);
    let actions = rec.recommend(&assessment(RiskTier::Critical, Trend::Falling, 200.0));

    let block = tier_actions(RiskTier::Critical);
    assert_eq!(actions.len(), block.len() + 2);
    for (i, expected) in block.iter().enumerate() {
        assert_eq!(actions[i], *expected, "tier action {i} out of order");
    }
    assert_eq!(actions[block.len()], DECLINING_VALUE_HINT);
    assert_eq!(actions[block.len() + 1], PREMIUM_HINT);
}

#[test]
fn hints_are_conditional() {
    let rec = ActionRecommender::new(150.0);

    let steady = rec.recommend(&assessment(RiskTier::High, Trend::Flat, 80.0));
    assert_eq!(steady.len(), tier_actions(RiskTier::High).len());

    let rising = rec.recommend(&assessment(RiskTier::Medium, Trend::Rising, 80.0));
    assert!(!rising.iter().any(|a| a == DECLINING_VALUE_HINT));
}

#[test]
fn premium_threshold_is_strict() {
    let rec = ActionRecommender::new(150.0);

    let at = rec.recommend(&assessment(RiskTier::Low, Trend::Flat, 150.0));
    assert!(at.is_empty(), "ticket equal to the threshold is not premium");

    let above = rec.recommend(&assessment(RiskTier::Low, Trend::Flat, 150.01));
    assert_eq!(above, vec![PREMIUM_HINT.to_string()]);
}

#[test]
fn recommendations_are_deterministic() {
    let rec = ActionRecommender::new(150.0);
    let a = assessment(RiskTier::High, Trend::Falling, 300.0);
    assert_eq!(rec.recommend(&a), rec.recommend(&a));
}
