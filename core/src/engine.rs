//! The retention engine. Wires the pipeline behind the cache.
//!
//! PIPELINE ORDER (fixed, runs to completion before anything is published):
//!   1. Bulk scan      every row of the partition
//!   2. Aggregate      normalize phones, group rows into profiles
//!   3. Score          repeat customers only (`min_visits`)
//!   4. Recommend      attach retention actions
//!   5. Sort           score desc, recency desc, key asc
//!   6. Summarize      tier counts, average score, value at risk
//!
//! RULES:
//!   - Queries never trigger more than one concurrent pipeline per partition.
//!   - A failed pipeline leaves the cache as it was.
//!   - Time is read from the injected clock only.

use crate::{
    actions::ActionRecommender,
    cache::{CacheEntry, TtlCache},
    clock::{Clock, SystemClock},
    config::RetentionConfig,
    error::RetentionResult,
    identity::PhoneNormalizer,
    profile::{AggregationStats, ProfileAggregator},
    query::{self, QueryRequest, QueryResponse, RiskSummary},
    scan::{BulkScanReader, ScanStats},
    scoring::{RiskAssessment, RiskScorer},
    source::{TransactionFilter, TransactionSource},
    types::PartitionKey,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub scan:             ScanStats,
    pub aggregation:      AggregationStats,
    /// Profiles left unscored for having fewer than `min_visits` visits.
    pub below_min_visits: usize,
    pub elapsed_ms:       u64,
}

/// Everything one recompute produces; the cached payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Sorted by score descending.
    pub assessments: Vec<RiskAssessment>,
    pub summary:     RiskSummary,
    pub diagnostics: PipelineDiagnostics,
}

pub struct RetentionEngine {
    config:      RetentionConfig,
    source:      Arc<dyn TransactionSource>,
    clock:       Arc<dyn Clock>,
    cache:       TtlCache<RiskReport>,
    reader:      BulkScanReader,
    normalizer:  PhoneNormalizer,
    scorer:      RiskScorer,
    recommender: ActionRecommender,
}

impl RetentionEngine {
    pub fn new(
        config: RetentionConfig,
        source: Arc<dyn TransactionSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = TtlCache::new(config.cache_ttl(), config.schema_version, Arc::clone(&clock))
            .with_stale_fallback(config.serve_stale_on_error);

        Self {
            reader:      BulkScanReader::new(config.page_size, config.max_pages),
            normalizer:  PhoneNormalizer::new(&config.area_codes),
            scorer:      RiskScorer::new(config.tier_thresholds),
            recommender: ActionRecommender::new(config.premium_ticket_threshold),
            cache,
            config,
            source,
            clock,
        }
    }

    /// Engine on the real clock.
    pub fn with_system_clock(config: RetentionConfig, source: Arc<dyn TransactionSource>) -> Self {
        Self::new(config, source, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }

    pub fn cache(&self) -> &TtlCache<RiskReport> {
        &self.cache
    }

    /// Run the full pipeline for `partition`, bypassing the cache.
    pub fn recompute(&self, partition: PartitionKey) -> RetentionResult<RiskReport> {
        let started = Instant::now();
        let today = self.clock.today();

        let filter = TransactionFilter::for_partition(partition);
        let (records, scan) = self.reader.fetch_all(self.source.as_ref(), &filter)?;

        let aggregator = ProfileAggregator::new(&self.normalizer, &self.config.placeholder_names);
        let (profiles, aggregation) = aggregator.aggregate(&records);
        drop(records);

        let mut below_min_visits = 0usize;
        let mut assessments: Vec<RiskAssessment> = Vec::with_capacity(profiles.len());
        for profile in profiles.values() {
            if profile.total_visits < self.config.min_visits {
                below_min_visits += 1;
                continue;
            }
            if let Some(mut assessment) = self.scorer.score(profile, today) {
                assessment.suggested_actions = self.recommender.recommend(&assessment);
                assessments.push(assessment);
            }
        }

        assessments.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.recency_days.cmp(&a.recency_days))
                .then_with(|| a.canonical_key.cmp(&b.canonical_key))
        });

        let summary = query::summarize(&assessments);
        let diagnostics = PipelineDiagnostics {
            scan,
            aggregation,
            below_min_visits,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        log::info!(
            "engine: partition={partition} scored {} customers from {} rows \
             (critical={}, high={}, medium={}, low={}) in {}ms",
            summary.total_customers,
            scan.rows_scanned,
            summary.counts_by_tier.critical,
            summary.counts_by_tier.high,
            summary.counts_by_tier.medium,
            summary.counts_by_tier.low,
            diagnostics.elapsed_ms,
        );

        Ok(RiskReport { assessments, summary, diagnostics })
    }

    /// The cached report for `partition`, recomputing on a miss.
    pub fn report(&self, partition: PartitionKey) -> RetentionResult<Arc<CacheEntry<RiskReport>>> {
        self.cache.get_or_compute(partition, || self.recompute(partition))
    }

    pub fn query(&self, request: &QueryRequest) -> RetentionResult<QueryResponse> {
        // Caller errors never cost a scan.
        query::validate_page(request.page, request.limit)?;

        let entry = self.report(request.partition)?;
        let (items, pagination) = query::paginate(
            &entry.payload.assessments,
            request.tier,
            request.page,
            request.limit,
        )?;

        log::debug!(
            "engine: query partition={} tier={} page {}/{} ({} items)",
            request.partition,
            request.tier.map_or("all", |t| t.as_str()),
            pagination.page,
            pagination.total_pages,
            items.len(),
        );

        Ok(QueryResponse {
            partition: request.partition,
            items,
            pagination,
            summary: entry.payload.summary,
            computed_at: entry.computed_at,
            schema_version: entry.schema_version,
        })
    }

    pub fn invalidate(&self, partition: PartitionKey) -> bool {
        self.cache.invalidate(partition)
    }
}
