//! Shared builders for unit tests.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{Competitor, Handicap, Sex};

pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// Competitor `n` who is exactly `age` years old on [`reference_date`].
pub fn competitor(n: u128, sex: Sex, age: i32, handicap: u8) -> Competitor {
    Competitor {
        competitor_id: id(n),
        name: format!("Competitor {n}"),
        birth_date: NaiveDate::from_ymd_opt(2025 - age, 1, 1).unwrap(),
        sex,
        handicap: Handicap::new(handicap).unwrap(),
    }
}

/// `count` male competitors aged 30 with handicap 2, ids starting at 1.
pub fn pool(count: u128) -> Vec<Competitor> {
    (1..=count).map(|n| competitor(n, Sex::Male, 30, 2)).collect()
}
