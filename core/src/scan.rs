//! Bulk scan: read every row of a partition through a page-capped source.
//!
//! The store never returns more than `page_size` rows per request, so the
//! reader walks offsets until a short page comes back. A hard page ceiling
//! bounds the work against a store that never returns a short page.
//!
//! All-or-nothing: any page failure, or hitting the ceiling, discards
//! everything accumulated so far.

use crate::{
    error::{RetentionError, RetentionResult},
    source::{TransactionFilter, TransactionRecord, TransactionSource},
};
use serde::{Deserialize, Serialize};

/// Progress is logged every this many rows.
const PROGRESS_LOG_INTERVAL: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub pages_fetched: usize,
    pub rows_scanned:  usize,
}

#[derive(Debug, Clone, Copy)]
pub struct BulkScanReader {
    page_size: usize,
    max_pages: usize,
}

impl BulkScanReader {
    pub fn new(page_size: usize, max_pages: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    pub fn fetch_all(
        &self,
        source: &dyn TransactionSource,
        filter: &TransactionFilter,
    ) -> RetentionResult<(Vec<TransactionRecord>, ScanStats)> {
        let mut rows = Vec::new();
        let mut stats = ScanStats::default();

        while stats.pages_fetched < self.max_pages {
            let offset = stats.pages_fetched * self.page_size;

            let page = source
                .fetch_page(filter, offset, self.page_size)
                .map_err(|e| {
                    log::warn!(
                        "scan: partition={} page at offset {offset} failed, discarding {} rows: {e}",
                        filter.partition,
                        rows.len(),
                    );
                    match e {
                        RetentionError::SourceUnavailable { .. } => e,
                        other => RetentionError::SourceUnavailable {
                            offset,
                            reason: other.to_string(),
                        },
                    }
                })?;

            let page_len = page.len();
            let before = rows.len();
            stats.pages_fetched += 1;
            stats.rows_scanned += page_len;
            rows.extend(page);

            let last_page = page_len < self.page_size;
            if last_page || rows.len() / PROGRESS_LOG_INTERVAL > before / PROGRESS_LOG_INTERVAL {
                log::debug!(
                    "scan: partition={} {} rows loaded ({} pages)",
                    filter.partition, rows.len(), stats.pages_fetched,
                );
            }

            if last_page {
                log::info!(
                    "scan: partition={} complete, {} rows in {} pages",
                    filter.partition, stats.rows_scanned, stats.pages_fetched,
                );
                return Ok((rows, stats));
            }
        }

        log::warn!(
            "scan: partition={} hit the {}-page ceiling with {} rows, refusing a truncated result",
            filter.partition, self.max_pages, rows.len(),
        );
        Err(RetentionError::ScanTruncated {
            pages: stats.pages_fetched,
            rows:  stats.rows_scanned,
        })
    }
}
