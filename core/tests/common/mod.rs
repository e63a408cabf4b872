//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use retention_core::{
    error::{RetentionError, RetentionResult},
    source::{TransactionFilter, TransactionRecord, TransactionSource},
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn record(name: &str, phone: &str, visit_date: &str, gross: f64, cover: f64) -> TransactionRecord {
    TransactionRecord {
        customer_name: name.into(),
        raw_phone: phone.into(),
        visit_date: visit_date.into(),
        gross_payment: gross,
        cover_charge: cover,
    }
}

/// In-process source over a fixed row list, with knobs for failure and latency.
pub struct VecSource {
    rows:           Vec<TransactionRecord>,
    calls:          AtomicUsize,
    fail_at_offset: Option<usize>,
    failing:        AtomicBool,
    delay:          Option<Duration>,
}

impl VecSource {
    pub fn new(rows: Vec<TransactionRecord>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
            fail_at_offset: None,
            failing: AtomicBool::new(false),
            delay: None,
        }
    }

    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every page request while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TransactionSource for VecSource {
    fn fetch_page(
        &self,
        _filter: &TransactionFilter,
        offset: usize,
        limit: usize,
    ) -> RetentionResult<Vec<TransactionRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing.load(Ordering::SeqCst) || self.fail_at_offset == Some(offset) {
            return Err(RetentionError::SourceUnavailable {
                offset,
                reason: "connection reset".into(),
            });
        }
        let start = offset.min(self.rows.len());
        let end = (offset + limit).min(self.rows.len());
        Ok(self.rows[start..end].to_vec())
    }
}

/// A misbehaving store that always returns a full page.
pub struct EndlessSource;

impl TransactionSource for EndlessSource {
    fn fetch_page(
        &self,
        _filter: &TransactionFilter,
        _offset: usize,
        limit: usize,
    ) -> RetentionResult<Vec<TransactionRecord>> {
        Ok((0..limit)
            .map(|_| record("Loop", "11999990000", "2025-01-01", 10.0, 0.0))
            .collect())
    }
}

/// `n` rows for `n` distinct single-visit customers.
pub fn distinct_rows(n: usize) -> Vec<TransactionRecord> {
    (0..n)
        .map(|i| record(&format!("Customer {i}"), &format!("119{i:08}"), "2025-01-10", 50.0, 0.0))
        .collect()
}
