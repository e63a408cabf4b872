//! Query façade helpers: tier filter, page slicing, and aggregate stats
//! over an already-sorted assessment list.

use crate::{
    error::{RetentionError, RetentionResult},
    scoring::{RiskAssessment, RiskTier},
    types::PartitionKey,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub partition: PartitionKey,
    /// Exact-match tier filter; `None` returns every tier.
    pub tier:      Option<RiskTier>,
    /// 1-based.
    pub page:      usize,
    pub limit:     usize,
}

impl QueryRequest {
    pub fn new(partition: PartitionKey, page: usize, limit: usize) -> Self {
        Self { partition, tier: None, page, limit }
    }

    pub fn with_tier(mut self, tier: RiskTier) -> Self {
        self.tier = Some(tier);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page:        usize,
    pub limit:       usize,
    pub total:       usize,
    pub total_pages: usize,
    pub has_more:    bool,
}

impl Pagination {
    /// Fails with `InvalidPage` when `page` or `limit` is 0.
    pub fn new(page: usize, limit: usize, total: usize) -> RetentionResult<Self> {
        validate_page(page, limit)?;
        let total_pages = total.div_ceil(limit);
        Ok(Self {
            page,
            limit,
            total,
            total_pages,
            has_more: page < total_pages,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub critical: usize,
    pub high:     usize,
    pub medium:   usize,
    pub low:      usize,
}

impl TierCounts {
    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Critical => self.critical,
            RiskTier::High     => self.high,
            RiskTier::Medium   => self.medium,
            RiskTier::Low      => self.low,
        }
    }

    fn increment(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Critical => self.critical += 1,
            RiskTier::High     => self.high += 1,
            RiskTier::Medium   => self.medium += 1,
            RiskTier::Low      => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total_customers:              usize,
    pub counts_by_tier:               TierCounts,
    pub average_score:                f64,
    /// Lifetime net spend of customers in the high and critical tiers.
    pub total_monetary_value_at_risk: f64,
}

pub fn summarize(assessments: &[RiskAssessment]) -> RiskSummary {
    let mut summary = RiskSummary {
        total_customers: assessments.len(),
        ..RiskSummary::default()
    };
    let mut score_sum = 0u64;

    for a in assessments {
        summary.counts_by_tier.increment(a.tier);
        score_sum += u64::from(a.score);
        if a.tier.is_at_risk() {
            summary.total_monetary_value_at_risk += a.total_spend;
        }
    }

    if !assessments.is_empty() {
        summary.average_score = score_sum as f64 / assessments.len() as f64;
    }
    summary
}

pub fn validate_page(page: usize, limit: usize) -> RetentionResult<()> {
    if page < 1 || limit < 1 {
        return Err(RetentionError::InvalidPage { page, limit });
    }
    Ok(())
}

/// Filter by tier, then take rows `[(page-1)*limit, page*limit)`.
/// Input order is preserved; a page past the end is empty, not an error.
pub fn paginate(
    assessments: &[RiskAssessment],
    tier: Option<RiskTier>,
    page: usize,
    limit: usize,
) -> RetentionResult<(Vec<RiskAssessment>, Pagination)> {
    let filtered: Vec<&RiskAssessment> = assessments
        .iter()
        .filter(|a| tier.map_or(true, |t| a.tier == t))
        .collect();

    let pagination = Pagination::new(page, limit, filtered.len())?;
    let items = filtered
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .cloned()
        .collect();

    Ok((items, pagination))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub partition:      PartitionKey,
    pub items:          Vec<RiskAssessment>,
    pub pagination:     Pagination,
    pub summary:        RiskSummary,
    pub computed_at:    DateTime<Utc>,
    pub schema_version: u32,
}
