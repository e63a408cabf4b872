//! Phone normalization: rejection, DDD expansion, pass-through, idempotence.

use retention_core::identity::{digits_only, PhoneNormalizer};

#[test]
fn ten_digit_number_with_known_ddd_gains_a_nine() {
    let n = PhoneNormalizer::default();
    assert_eq!(n.normalize("1133334444").as_deref(), Some("11933334444"));
}

#[test]
fn punctuation_is_stripped_before_expansion() {
    let n = PhoneNormalizer::default();
    assert_eq!(n.normalize("(11) 3333-4444").as_deref(), Some("11933334444"));
    assert_eq!(n.normalize(" 61 98888-7777 ").as_deref(), Some("61988887777"));
}

#[test]
fn fewer_than_ten_digits_is_rejected() {
    let n = PhoneNormalizer::default();
    for raw in ["", "abc", "123", "999-9999", "(11) 9999-999", "113333444"] {
        assert!(
            n.normalize(raw).is_none(),
            "'{raw}' has {} digits and must be rejected",
            digits_only(raw).len()
        );
    }
}

#[test]
fn eleven_digit_numbers_pass_through() {
    let n = PhoneNormalizer::default();
    assert_eq!(n.normalize("21987654321").as_deref(), Some("21987654321"));
}

#[test]
fn unknown_area_code_and_other_lengths_pass_through() {
    let n = PhoneNormalizer::default();
    // "20" and "10" are not DDDs.
    assert_eq!(n.normalize("2033334444").as_deref(), Some("2033334444"));
    assert_eq!(n.normalize("1033334444").as_deref(), Some("1033334444"));
    // International prefix: 13 digits, kept as-is.
    assert_eq!(n.normalize("+55 11 98765-4321").as_deref(), Some("5511987654321"));
}

#[test]
fn custom_area_code_table_is_respected() {
    let n = PhoneNormalizer::new(&["61"]);
    assert_eq!(n.normalize("6133334444").as_deref(), Some("61933334444"));
    assert_eq!(n.normalize("1133334444").as_deref(), Some("1133334444"));
}

#[test]
fn normalization_is_idempotent() {
    let n = PhoneNormalizer::default();
    let samples = [
        "1133334444",
        "(11) 3333-4444",
        "11933334444",
        "2033334444",
        "+55 11 98765-4321",
        "479 8888 7777",
        "12345678901234",
    ];
    for raw in samples {
        let once = n.normalize(raw).expect("sample should normalize");
        let twice = n.normalize(&once);
        assert_eq!(twice.as_deref(), Some(once.as_str()), "normalize not idempotent for '{raw}'");
    }
}

#[test]
fn legacy_and_modern_forms_resolve_to_the_same_key() {
    let n = PhoneNormalizer::default();
    let legacy = n.normalize("31 8765-4321");
    let modern = n.normalize("(31) 98765-4321");
    assert!(legacy.is_some());
    assert_eq!(legacy, modern);
}
