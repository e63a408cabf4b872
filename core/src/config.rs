use serde::{Deserialize, Serialize};

/// Bumped whenever scoring output changes shape or meaning.
/// Cached reports stamped with any other version are recomputed.
pub const SCHEMA_VERSION: u32 = 1;

/// Brazilian DDD area codes whose 10-digit mobile numbers predate the
/// leading `9` and get it inserted during normalization.
pub const DEFAULT_AREA_CODES: &[&str] = &[
    "11", "12", "13", "14", "15", "16", "17", "18", "19",
    "21", "22", "24", "27", "28",
    "31", "32", "33", "34", "35", "37", "38",
    "41", "42", "43", "44", "45", "46", "47", "48", "49",
    "51", "53", "54", "55",
    "61", "62", "63", "64", "65", "66", "67", "68", "69",
    "71", "73", "74", "75", "77", "79",
    "81", "82", "83", "84", "85", "86", "87", "88", "89",
    "91", "92", "93", "94", "95", "96", "97", "98", "99",
];

/// Names the point-of-sale uses for tabs that are not a real customer.
pub const DEFAULT_PLACEHOLDER_NAMES: &[&str] = &[
    "MESA", "SEM NOME", "BALCAO", "HOUSE ACCOUNT", "WALK-IN", "COUNTER",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub critical: u32,
    pub high:     u32,
    pub medium:   u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self { critical: 70, high: 50, medium: 25 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Row ceiling the upstream store applies to a single request.
    pub page_size: usize,
    /// Hard ceiling on page requests per bulk scan.
    pub max_pages: usize,
    pub cache_ttl_secs: i64,
    /// Omit from config files so deployments follow `SCHEMA_VERSION`.
    pub schema_version: u32,
    pub area_codes: Vec<String>,
    pub placeholder_names: Vec<String>,
    /// Customers with fewer visits than this are not assessed.
    pub min_visits: usize,
    pub tier_thresholds: TierThresholds,
    /// Average ticket above which the "premium treatment" hint is added.
    pub premium_ticket_threshold: f64,
    /// Serve the last expired report when a recompute fails.
    pub serve_stale_on_error: bool,
    pub default_page_limit: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 200,
            cache_ttl_secs: 5 * 60,
            schema_version: SCHEMA_VERSION,
            area_codes: DEFAULT_AREA_CODES.iter().map(|s| s.to_string()).collect(),
            placeholder_names: DEFAULT_PLACEHOLDER_NAMES.iter().map(|s| s.to_string()).collect(),
            min_visits: 2,
            tier_thresholds: TierThresholds::default(),
            premium_ticket_threshold: 150.0,
            serve_stale_on_error: false,
            default_page_limit: 50,
        }
    }
}

impl RetentionConfig {
    /// Load from the data/ directory.
    /// In tests, use RetentionConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/retention/retention_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RetentionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::debug!(
            "config: loaded {path} (page_size={}, ttl={}s, schema=v{})",
            config.page_size, config.cache_ttl_secs, config.schema_version,
        );
        Ok(config)
    }

    /// Config with hardcoded values for use in tests.
    /// Small pages so multi-page scans need only a handful of rows.
    pub fn default_test() -> Self {
        Self {
            page_size: 10,
            max_pages: 50,
            cache_ttl_secs: 60,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.page_size == 0 {
            anyhow::bail!("page_size must be >= 1");
        }
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be >= 1");
        }
        if self.cache_ttl_secs < 0 {
            anyhow::bail!("cache_ttl_secs must be >= 0, got {}", self.cache_ttl_secs);
        }
        let t = &self.tier_thresholds;
        if !(t.critical <= 100 && t.critical > t.high && t.high > t.medium) {
            anyhow::bail!(
                "tier thresholds must be strictly descending within 0..=100, got {}/{}/{}",
                t.critical, t.high, t.medium,
            );
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs)
    }
}
