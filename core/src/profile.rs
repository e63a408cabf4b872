//! Profile aggregation: raw transaction rows into per-customer visit histories.
//!
//! Malformed rows (no usable phone, placeholder or empty name, unparseable
//! date) are dropped and counted. They never fail the pass.

use crate::{
    identity::PhoneNormalizer,
    source::TransactionRecord,
    types::CanonicalKey,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub date:      NaiveDate,
    pub net_spend: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub canonical_key: CanonicalKey,
    pub display_name:  String,
    /// Input order; the scorer sorts.
    pub visits:        Vec<Visit>,
    pub total_visits:  usize,
    pub total_spend:   f64,
}

impl CustomerProfile {
    fn new(canonical_key: CanonicalKey, display_name: String) -> Self {
        Self {
            canonical_key,
            display_name,
            visits: Vec::new(),
            total_visits: 0,
            total_spend: 0.0,
        }
    }

    fn record_visit(&mut self, visit: Visit, name: &str) {
        self.total_visits += 1;
        self.total_spend += visit.net_spend;
        self.visits.push(visit);
        // Longest name wins: "Ana" then "Ana Paula Souza" keeps the latter.
        if name.chars().count() > self.display_name.chars().count() {
            self.display_name = name.to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationStats {
    pub records_seen:             usize,
    pub dropped_unidentified:     usize,
    pub dropped_placeholder_name: usize,
    pub dropped_invalid_date:     usize,
    pub profiles:                 usize,
}

impl AggregationStats {
    pub fn dropped_total(&self) -> usize {
        self.dropped_unidentified + self.dropped_placeholder_name + self.dropped_invalid_date
    }
}

/// Case-insensitive match of the trimmed name against the denylist.
/// Empty names count as placeholders.
pub fn is_placeholder_name<S: AsRef<str>>(name: &str, denylist: &[S]) -> bool {
    let name = name.trim();
    name.is_empty()
        || denylist
            .iter()
            .any(|p| p.as_ref().trim().eq_ignore_ascii_case(name))
}

pub struct ProfileAggregator<'a> {
    normalizer:        &'a PhoneNormalizer,
    placeholder_names: &'a [String],
}

impl<'a> ProfileAggregator<'a> {
    pub fn new(normalizer: &'a PhoneNormalizer, placeholder_names: &'a [String]) -> Self {
        Self { normalizer, placeholder_names }
    }

    pub fn aggregate(
        &self,
        records: &[TransactionRecord],
    ) -> (HashMap<CanonicalKey, CustomerProfile>, AggregationStats) {
        let mut profiles: HashMap<CanonicalKey, CustomerProfile> = HashMap::new();
        let mut stats = AggregationStats {
            records_seen: records.len(),
            ..AggregationStats::default()
        };

        for record in records {
            let Some(key) = self.normalizer.normalize(&record.raw_phone) else {
                stats.dropped_unidentified += 1;
                continue;
            };

            let name = record.customer_name.trim();
            if is_placeholder_name(name, self.placeholder_names) {
                stats.dropped_placeholder_name += 1;
                continue;
            }

            // Some exports append a time component; only the business date matters.
            let raw_date = record.visit_date.trim();
            let raw_date = raw_date.get(..10).unwrap_or(raw_date);
            let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
                stats.dropped_invalid_date += 1;
                continue;
            };

            let visit = Visit {
                date,
                net_spend: record.gross_payment - record.cover_charge,
            };

            profiles
                .entry(key.clone())
                .or_insert_with(|| CustomerProfile::new(key, name.to_string()))
                .record_visit(visit, name);
        }

        stats.profiles = profiles.len();
        if stats.dropped_total() > 0 {
            log::debug!(
                "aggregate: dropped {} of {} rows (unidentified={}, placeholder={}, bad_date={})",
                stats.dropped_total(),
                stats.records_seen,
                stats.dropped_unidentified,
                stats.dropped_placeholder_name,
                stats.dropped_invalid_date,
            );
        }

        (profiles, stats)
    }
}
