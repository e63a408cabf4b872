//! Shared primitive types used across the retention engine.

/// A normalized phone number: the stable identity of one customer.
pub type CanonicalKey = String;

/// The tenant partition (one venue) that every scan and cache entry is scoped to.
pub type PartitionKey = i64;
