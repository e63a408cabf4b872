//! Churn risk scoring: one customer profile in, one `RiskAssessment` out.
//!
//! The composite score is the sum of four capped components:
//!   recency     0–40  days since the last visit
//!   frequency   0–25  visit-count change, last 30d vs the 30d before
//!   value       0–25  net-spend change over the same windows
//!   engagement  0–10  established regulars with no visit this month
//!
//! Each component is an ordered band table evaluated first-match-wins,
//! so tie-breaks at band edges are explicit and testable on their own.
//!
//! Pure: the same profile and `today` always produce the same assessment.

use crate::{
    config::TierThresholds,
    profile::CustomerProfile,
    types::CanonicalKey,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u32 = 100;

/// Width of one comparison window in days.
pub const WINDOW_DAYS: i64 = 30;

// ── Band tables ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    AtMost(f64),
    Below(f64),
}

impl Threshold {
    pub fn matches(self, value: f64) -> bool {
        match self {
            Threshold::Above(t)  => value > t,
            Threshold::AtMost(t) => value <= t,
            Threshold::Below(t)  => value < t,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BandTable {
    pub name:  &'static str,
    pub bands: &'static [(Threshold, u32)],
}

impl BandTable {
    /// Points of the first matching band, 0 when none match.
    pub fn points(&self, value: f64) -> u32 {
        self.bands
            .iter()
            .find(|(threshold, _)| threshold.matches(value))
            .map(|(_, points)| *points)
            .unwrap_or(0)
    }

    pub fn max_points(&self) -> u32 {
        self.bands.iter().map(|(_, p)| *p).max().unwrap_or(0)
    }
}

pub const RECENCY_BANDS: BandTable = BandTable {
    name: "recency",
    bands: &[
        (Threshold::Above(60.0), 40),
        (Threshold::Above(45.0), 30),
        (Threshold::Above(30.0), 20),
        (Threshold::Above(14.0), 10),
        (Threshold::Above(7.0),   5),
    ],
};

const DECLINE_BANDS: &[(Threshold, u32)] = &[
    (Threshold::AtMost(-75.0), 25),
    (Threshold::AtMost(-50.0), 18),
    (Threshold::AtMost(-25.0), 10),
    (Threshold::Below(0.0),     5),
];

pub const FREQUENCY_BANDS: BandTable = BandTable { name: "frequency", bands: DECLINE_BANDS };
pub const VALUE_BANDS: BandTable = BandTable { name: "value", bands: DECLINE_BANDS };

/// (minimum lifetime visits, points), applied only when the customer has
/// not visited in the current window.
pub const ENGAGEMENT_BANDS: &[(usize, u32)] = &[(10, 10), (5, 7), (3, 5)];

pub fn engagement_points(total_visits: usize, visits_30d: usize) -> u32 {
    if visits_30d > 0 {
        return 0;
    }
    ENGAGEMENT_BANDS
        .iter()
        .find(|(min_visits, _)| total_visits >= *min_visits)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

/// Percent change from the prior window to the current one.
///
/// With nothing in the prior window the ratio is undefined: a customer who
/// is also absent now counts as a full drop (−100), one who is active now
/// counts as neutral (0).
pub fn delta_pct(current: f64, prior: f64) -> f64 {
    if prior > 0.0 {
        (current - prior) / prior * 100.0
    } else if current <= 0.0 {
        -100.0
    } else {
        0.0
    }
}

// ── Labels ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Flat,
    Falling,
}

impl Trend {
    pub fn between(current: f64, prior: f64) -> Self {
        if current > prior {
            Trend::Rising
        } else if current < prior {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [RiskTier::Critical, RiskTier::High, RiskTier::Medium, RiskTier::Low];

    pub fn from_score(score: u32, t: &TierThresholds) -> Self {
        if score >= t.critical {
            RiskTier::Critical
        } else if score >= t.high {
            RiskTier::High
        } else if score >= t.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low      => "low",
            RiskTier::Medium   => "medium",
            RiskTier::High     => "high",
            RiskTier::Critical => "critical",
        }
    }

    /// Tiers whose customers count toward the monetary value at risk.
    pub fn is_at_risk(&self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low"      => Ok(RiskTier::Low),
            "medium"   => Ok(RiskTier::Medium),
            "high"     => Ok(RiskTier::High),
            "critical" => Ok(RiskTier::Critical),
            other      => Err(format!("unknown risk tier '{other}'")),
        }
    }
}

// ── Assessment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub recency:    u32,
    pub frequency:  u32,
    pub value:      u32,
    pub engagement: u32,
}

impl ScoreComponents {
    pub fn composite(&self) -> u32 {
        (self.recency + self.frequency + self.value + self.engagement).min(MAX_SCORE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub canonical_key:       CanonicalKey,
    pub display_name:        String,
    pub last_visit:          NaiveDate,
    pub recency_days:        i64,
    pub visits_30d:          usize,
    pub visits_30_60d:       usize,
    pub spend_30d:           f64,
    pub spend_30_60d:        f64,
    pub total_visits:        usize,
    pub total_spend:         f64,
    pub average_ticket:      f64,
    pub frequency_delta_pct: f64,
    pub value_delta_pct:     f64,
    pub frequency_trend:     Trend,
    pub value_trend:         Trend,
    pub components:          ScoreComponents,
    pub score:               u32,
    pub tier:                RiskTier,
    pub suggested_actions:   Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct WindowTotals {
    visits: usize,
    spend:  f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RiskScorer {
    thresholds: TierThresholds,
}

impl RiskScorer {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// Score one profile as of `today`. `None` for a profile with no visits.
    ///
    /// `suggested_actions` is left empty; the recommender fills it.
    pub fn score(&self, profile: &CustomerProfile, today: NaiveDate) -> Option<RiskAssessment> {
        let mut visits = profile.visits.clone();
        visits.sort_by(|a, b| b.date.cmp(&a.date));
        let last_visit = visits.first()?.date;

        // Visits dated after `today` are treated as today.
        let recency_days = (today - last_visit).num_days().max(0);

        let current_start = today - Duration::days(WINDOW_DAYS);
        let prior_start = today - Duration::days(2 * WINDOW_DAYS);

        let mut current = WindowTotals::default();
        let mut prior = WindowTotals::default();
        for v in &visits {
            if v.date >= current_start {
                current.visits += 1;
                current.spend += v.net_spend;
            } else if v.date >= prior_start {
                prior.visits += 1;
                prior.spend += v.net_spend;
            }
        }

        let frequency_delta_pct = delta_pct(current.visits as f64, prior.visits as f64);
        let value_delta_pct = delta_pct(current.spend, prior.spend);

        let components = ScoreComponents {
            recency:    RECENCY_BANDS.points(recency_days as f64),
            frequency:  FREQUENCY_BANDS.points(frequency_delta_pct),
            value:      VALUE_BANDS.points(value_delta_pct),
            engagement: engagement_points(profile.total_visits, current.visits),
        };
        let score = components.composite();

        let average_ticket = if profile.total_visits > 0 {
            profile.total_spend / profile.total_visits as f64
        } else {
            0.0
        };

        Some(RiskAssessment {
            canonical_key: profile.canonical_key.clone(),
            display_name: profile.display_name.clone(),
            last_visit,
            recency_days,
            visits_30d: current.visits,
            visits_30_60d: prior.visits,
            spend_30d: current.spend,
            spend_30_60d: prior.spend,
            total_visits: profile.total_visits,
            total_spend: profile.total_spend,
            average_ticket,
            frequency_delta_pct,
            value_delta_pct,
            frequency_trend: Trend::between(current.visits as f64, prior.visits as f64),
            value_trend: Trend::between(current.spend, prior.spend),
            components,
            score,
            tier: RiskTier::from_score(score, &self.thresholds),
            suggested_actions: Vec::new(),
        })
    }
}
