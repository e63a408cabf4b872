//! Phone-number identity resolution.
//!
//! The point-of-sale stores phone numbers however the cashier typed them:
//! with or without punctuation, and often in the pre-2016 10-digit mobile
//! form. Normalization folds those variants into one canonical key.

use crate::{config::DEFAULT_AREA_CODES, types::CanonicalKey};
use std::collections::HashSet;

/// Fewer digits than this cannot identify a customer.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Keep only ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    area_codes: HashSet<String>,
}

impl PhoneNormalizer {
    pub fn new<S: AsRef<str>>(area_codes: &[S]) -> Self {
        Self {
            area_codes: area_codes.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn is_known_area_code(&self, code: &str) -> bool {
        self.area_codes.contains(code)
    }

    /// Canonical key for `raw`, or `None` when too few digits remain.
    ///
    /// A 10-digit number with a known area code gains a `9` after the area
    /// code. Every other length passes through unchanged, so the result is
    /// a fixed point: normalizing a key again returns the same key.
    pub fn normalize(&self, raw: &str) -> Option<CanonicalKey> {
        let digits = digits_only(raw);
        if digits.len() < MIN_PHONE_DIGITS {
            return None;
        }

        if digits.len() == 10 && self.is_known_area_code(&digits[..2]) {
            let (area, subscriber) = digits.split_at(2);
            return Some(format!("{area}9{subscriber}"));
        }

        Some(digits)
    }
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_AREA_CODES)
    }
}
