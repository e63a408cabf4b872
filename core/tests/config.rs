//! Config loading: the shipped data/ file and validation.

use retention_core::config::{RetentionConfig, SCHEMA_VERSION};

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn shipped_config_loads_and_tracks_schema_constant() {
    let config = RetentionConfig::load(&data_dir()).unwrap();

    assert_eq!(
        config.schema_version, SCHEMA_VERSION,
        "shipped config must not pin a schema version"
    );
    assert_eq!(config.page_size, 1000);
    assert_eq!(config.max_pages, 200);
    assert_eq!(config.cache_ttl_secs, 300);
    assert!(config.area_codes.iter().any(|c| c == "11"));
}

#[test]
fn shipped_config_file_has_no_schema_version_key() {
    let path = format!("{}/retention/retention_config.json", data_dir());
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert!(raw.get("schema_version").is_none());
}

#[test]
fn missing_config_file_is_an_error() {
    assert!(RetentionConfig::load("/nonexistent/retention-data").is_err());
}

#[test]
fn validation_rejects_bad_values() {
    assert!(RetentionConfig::default().validate().is_ok());
    assert!(RetentionConfig::default_test().validate().is_ok());

    let zero_pages = RetentionConfig { page_size: 0, ..RetentionConfig::default() };
    assert!(zero_pages.validate().is_err());

    let mut inverted = RetentionConfig::default();
    inverted.tier_thresholds.high = inverted.tier_thresholds.critical;
    assert!(inverted.validate().is_err());
}
