use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CategoryKind;

/// Points earned by one competitor in one event. Rescoring an event
/// replaces its records wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub competitor_id: Uuid,
    pub prova_id: Uuid,
    pub category: CategoryKind,
    pub event_date: NaiveDate,
    pub placement: u32,
    pub placement_points: u32,
    pub prize_points: u64,
    pub points: u64,
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Period {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Calendar year `year`, or `None` if the year is out of chrono's range.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            from: NaiveDate::from_ymd_opt(year, 1, 1)?,
            to: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn label(&self) -> String {
        if self.from.month() == 1
            && self.from.day() == 1
            && self.to.month() == 12
            && self.to.day() == 31
            && self.from.year() == self.to.year()
        {
            self.from.year().to_string()
        } else {
            format!("{}..{}", self.from, self.to)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingFilter {
    pub category: Option<CategoryKind>,
    pub period: Option<Period>,
    pub limit: Option<usize>,
}

impl RankingFilter {
    pub fn matches(&self, record: &ScoreRecord) -> bool {
        self.category.is_none_or(|c| c == record.category)
            && self.period.is_none_or(|p| p.contains(record.event_date))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub position: usize,
    pub competitor_id: Uuid,
    pub total_points: u64,
    pub events: usize,
    pub best_placement: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub category: Option<CategoryKind>,
    pub period: Option<Period>,
    pub entries: Vec<RankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorStats {
    pub competitor_id: Uuid,
    pub events: usize,
    pub total_points: u64,
    pub average_points: Decimal,
    pub best_placement: Option<u32>,
    pub worst_placement: Option<u32>,
    pub prize_points: u64,
    pub points_by_category: BTreeMap<CategoryKind, u64>,
}

/// Best scorer of one handicap level, a Champions Cup seed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandicapChampion {
    pub handicap: u8,
    pub competitor_id: Uuid,
    pub total_points: u64,
}
