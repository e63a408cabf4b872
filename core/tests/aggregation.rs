//! Profile aggregation: identity merge, drops, names, net spend.

mod common;

use common::{date, record};
use retention_core::{
    config::RetentionConfig,
    identity::PhoneNormalizer,
    profile::{is_placeholder_name, ProfileAggregator},
};

fn aggregator_parts() -> (PhoneNormalizer, Vec<String>) {
    let config = RetentionConfig::default_test();
    (PhoneNormalizer::new(&config.area_codes), config.placeholder_names)
}

#[test]
fn phone_variants_merge_into_one_profile() {
    let (normalizer, placeholders) = aggregator_parts();
    let agg = ProfileAggregator::new(&normalizer, &placeholders);

    let records = vec![
        record("Ana", "1133334444", "2025-01-20", 120.0, 0.0),
        record("Ana Souza", "(11) 93333-4444", "2025-01-10", 80.0, 20.0),
        record("Ana", "11 93333 4444", "2024-12-25", 50.0, 0.0),
    ];
    let (profiles, stats) = agg.aggregate(&records);

    assert_eq!(profiles.len(), 1);
    assert_eq!(stats.profiles, 1);
    let p = &profiles["11933334444"];
    assert_eq!(p.total_visits, 3);
    assert_eq!(p.visits.len(), 3);
    assert!((p.total_spend - 230.0).abs() < 1e-9, "net spend = gross - cover");
}

#[test]
fn longest_name_wins_regardless_of_order() {
    let (normalizer, placeholders) = aggregator_parts();
    let agg = ProfileAggregator::new(&normalizer, &placeholders);

    let records = vec![
        record("Bruno", "21987654321", "2025-01-01", 10.0, 0.0),
        record("Bruno Lima Costa", "21987654321", "2025-01-02", 10.0, 0.0),
        record("Bruno Lima", "21987654321", "2025-01-03", 10.0, 0.0),
    ];
    let (profiles, _) = agg.aggregate(&records);

    assert_eq!(profiles["21987654321"].display_name, "Bruno Lima Costa");
}

#[test]
fn malformed_rows_are_dropped_and_counted() {
    let (normalizer, placeholders) = aggregator_parts();
    let agg = ProfileAggregator::new(&normalizer, &placeholders);

    let records = vec![
        record("Carla", "", "2025-01-01", 10.0, 0.0),
        record("Carla", "12345", "2025-01-01", 10.0, 0.0),
        record("MESA", "11988887777", "2025-01-01", 10.0, 0.0),
        record("  balcao ", "11988887777", "2025-01-01", 10.0, 0.0),
        record("   ", "11988887777", "2025-01-01", 10.0, 0.0),
        record("Carla", "11988887777", "not a date", 10.0, 0.0),
        record("Carla", "11988887777", "2025-01-01", 10.0, 0.0),
    ];
    let (profiles, stats) = agg.aggregate(&records);

    assert_eq!(stats.records_seen, 7);
    assert_eq!(stats.dropped_unidentified, 2);
    assert_eq!(stats.dropped_placeholder_name, 3);
    assert_eq!(stats.dropped_invalid_date, 1);
    assert_eq!(stats.dropped_total(), 6);
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles["11988887777"].total_visits, 1);
}

#[test]
fn timestamped_dates_keep_the_business_day() {
    let (normalizer, placeholders) = aggregator_parts();
    let agg = ProfileAggregator::new(&normalizer, &placeholders);

    let records = vec![record("Davi", "11988887777", "2025-01-05T23:10:00", 10.0, 0.0)];
    let (profiles, _) = agg.aggregate(&records);

    assert_eq!(profiles["11988887777"].visits[0].date, date("2025-01-05"));
}

#[test]
fn aggregation_preserves_input_order_of_visits() {
    let (normalizer, placeholders) = aggregator_parts();
    let agg = ProfileAggregator::new(&normalizer, &placeholders);

    let records = vec![
        record("Eva", "11988887777", "2024-11-01", 10.0, 0.0),
        record("Eva", "11988887777", "2025-01-20", 10.0, 0.0),
        record("Eva", "11988887777", "2024-12-25", 10.0, 0.0),
    ];
    let (profiles, _) = agg.aggregate(&records);

    let dates: Vec<_> = profiles["11988887777"].visits.iter().map(|v| v.date).collect();
    assert_eq!(dates, vec![date("2024-11-01"), date("2025-01-20"), date("2024-12-25")]);
}

#[test]
fn placeholder_match_is_trimmed_and_case_insensitive() {
    let denylist = ["MESA", "Walk-In"];
    assert!(is_placeholder_name("mesa", &denylist));
    assert!(is_placeholder_name(" WALK-IN ", &denylist));
    assert!(is_placeholder_name("", &denylist));
    assert!(!is_placeholder_name("Mesa Redonda Bar", &denylist));
}
