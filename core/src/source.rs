//! The upstream transaction store, seen from the engine.
//!
//! RULE: the engine only ever reads through `TransactionSource`.
//! It never writes upstream rows and never assumes more than
//! offset-based paging with a capped page size.

use crate::{error::RetentionResult, types::PartitionKey};
use serde::{Deserialize, Serialize};

/// One raw point-of-sale row exactly as the upstream store holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub customer_name: String,
    pub raw_phone:     String,
    /// ISO `YYYY-MM-DD` business date. Kept raw; parsed during aggregation.
    pub visit_date:    String,
    pub gross_payment: f64,
    pub cover_charge:  f64,
}

/// Row filter pushed down to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFilter {
    pub partition: PartitionKey,
}

impl TransactionFilter {
    pub fn for_partition(partition: PartitionKey) -> Self {
        Self { partition }
    }
}

pub trait TransactionSource: Send + Sync {
    /// Return up to `limit` rows matching `filter`, starting at `offset`,
    /// in a stable order. Implementations may cap `limit` lower.
    fn fetch_page(
        &self,
        filter: &TransactionFilter,
        offset: usize,
        limit: usize,
    ) -> RetentionResult<Vec<TransactionRecord>>;
}
