//! Customer retention risk engine.
//!
//! Turns raw point-of-sale rows into a per-customer churn-risk
//! classification behind a versioned, single-flight TTL cache.

pub mod actions;
pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod profile;
pub mod query;
pub mod scan;
pub mod scoring;
pub mod source;
pub mod store;
pub mod synth;
pub mod types;
