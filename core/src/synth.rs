//! Deterministic synthetic point-of-sale data.
//!
//! RULE: same seed, same rows. All randomness flows through one
//! `SeededRng`, never a platform RNG.
//!
//! The generated population exercises the messy parts of real data:
//! one customer's phone typed three different ways, names sometimes
//! truncated to a first name, placeholder tabs with no phone, and visit
//! rhythms ranging from weekly regulars to customers who lapsed months ago.

use crate::{config::DEFAULT_AREA_CODES, source::TransactionRecord};
use chrono::{Duration, NaiveDate};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct SeededRng {
    inner: Pcg64Mcg,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    /// Simplified Pareto draw: heavy right tail above `x_min`.
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }
}

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Camila", "Diego", "Eduarda", "Felipe", "Gabriela", "Heitor",
    "Isabela", "João", "Larissa", "Mateus", "Natália", "Otávio", "Paula", "Rafael",
    "Sofia", "Thiago", "Valentina", "Vinícius",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Cardoso", "Costa", "Ferreira", "Gomes", "Lima",
    "Martins", "Oliveira", "Pereira", "Ribeiro", "Rodrigues", "Santos", "Silva",
    "Souza",
];

const PLACEHOLDER_TABS: &[&str] = &["MESA", "BALCAO", "SEM NOME"];

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub customers:        usize,
    pub today:            NaiveDate,
    /// How far back visits may go.
    pub history_days:     i64,
    /// Probability that a generated row is an anonymous placeholder tab.
    pub placeholder_rate: f64,
}

impl SynthConfig {
    pub fn new(customers: usize, today: NaiveDate) -> Self {
        Self {
            customers,
            today,
            history_days: 180,
            placeholder_rate: 0.05,
        }
    }
}

/// The three ways a cashier might type the same mobile number.
fn phone_variant(rng: &mut SeededRng, area: &str, subscriber: u64) -> String {
    let sub = format!("{subscriber:08}");
    match rng.next_u64_below(3) {
        0 => format!("{area}9{sub}"),
        1 => format!("({area}) 9{}-{}", &sub[..4], &sub[4..]),
        // Pre-2016 form without the leading 9.
        _ => format!("{area} {}-{}", &sub[..4], &sub[4..]),
    }
}

pub fn synthesize(seed: u64, cfg: &SynthConfig) -> Vec<TransactionRecord> {
    let mut rng = SeededRng::new(seed);
    let mut rows = Vec::new();

    for _ in 0..cfg.customers {
        let area = *rng.pick(DEFAULT_AREA_CODES);
        let subscriber = 10_000_000 + rng.next_u64_below(90_000_000);
        let first = *rng.pick(FIRST_NAMES);
        let full_name = format!("{first} {}", rng.pick(LAST_NAMES));

        // Mean days between visits, and days since the customer stopped coming.
        let gap_mean = 3.0 + rng.next_f64() * 40.0;
        let lapse = if rng.chance(0.4) {
            rng.next_u64_below(120) as i64
        } else {
            rng.next_u64_below(7) as i64
        };

        let mut day = lapse;
        while day < cfg.history_days {
            let date = cfg.today - Duration::days(day);
            let gross = (rng.pareto(40.0, 2.2) * 100.0).round() / 100.0;
            let cover = if rng.chance(0.3) { 20.0 } else { 0.0 };
            let name = if rng.chance(0.3) { first.to_string() } else { full_name.clone() };

            rows.push(TransactionRecord {
                customer_name: name,
                raw_phone: phone_variant(&mut rng, area, subscriber),
                visit_date: date.format("%Y-%m-%d").to_string(),
                gross_payment: gross + cover,
                cover_charge: cover,
            });

            if rng.chance(cfg.placeholder_rate) {
                rows.push(TransactionRecord {
                    customer_name: rng.pick(PLACEHOLDER_TABS).to_string(),
                    raw_phone: String::new(),
                    visit_date: date.format("%Y-%m-%d").to_string(),
                    gross_payment: rng.pareto(25.0, 2.5),
                    cover_charge: 0.0,
                });
            }

            day += 1 + (rng.next_f64() * 2.0 * gap_mean) as i64;
        }
    }

    rows
}
