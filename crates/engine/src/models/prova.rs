use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryKind, Trio};

/// A competition event (prova) for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prova {
    pub prova_id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub category: CategoryKind,
    /// Overrides the configured prize discount for this event.
    #[serde(default)]
    pub prize_discount: Option<Decimal>,
    #[serde(default)]
    pub trios: Vec<Trio>,
    #[serde(default)]
    pub results: Vec<EventResult>,
}

impl Prova {
    pub fn trio(&self, number: u32) -> Option<&Trio> {
        self.trios.iter().find(|t| t.number == number)
    }
}

/// Finishing position and prize of one trio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    pub trio_number: u32,
    pub placement: u32,
    #[serde(default)]
    pub prize_amount: Decimal,
}
