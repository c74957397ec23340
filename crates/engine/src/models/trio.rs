use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{CategoryKind, Roster, Sex};

pub const TRIO_SIZE: usize = 3;

/// Reason a candidate trio fails its category rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Violation {
    #[error("a trio needs exactly 3 competitors, got {found}")]
    WrongSize { found: usize },

    #[error("competitor {competitor_id} appears more than once")]
    DuplicateMember { competitor_id: Uuid },

    #[error("competitor {competitor_id} is not part of the snapshot")]
    UnknownMember { competitor_id: Uuid },

    #[error("competitor {competitor_id} does not have the required sex ({required:?})")]
    SexMismatch { competitor_id: Uuid, required: Sex },

    #[error("age sum {total} exceeds the limit of {limit}")]
    AgeSumExceeded { total: u32, limit: u32 },

    #[error("handicap sum {total} exceeds the limit of {limit}")]
    HandicapSumExceeded { total: u32, limit: u32 },
}

/// A violation pinned to the trio that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("trio {number} {members:?}: {violation}")]
pub struct TrioViolation {
    pub number: u32,
    pub members: [Uuid; TRIO_SIZE],
    pub violation: Violation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "violation", rename_all = "snake_case")]
pub enum TrioStatus {
    #[default]
    Unvalidated,
    Valid,
    Invalid(Violation),
}

/// Three competitors entered together. Holds references (ids) only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trio {
    /// Position of the trio in its event, starting at 1.
    pub number: u32,
    pub category: CategoryKind,
    pub members: [Uuid; TRIO_SIZE],
    /// Champions Cup seed placed in this trio, if any.
    #[serde(default)]
    pub seed: Option<Uuid>,
    #[serde(default)]
    pub status: TrioStatus,
}

impl Trio {
    pub fn new(number: u32, category: CategoryKind, members: [Uuid; TRIO_SIZE]) -> Self {
        Self {
            number,
            category,
            members,
            seed: None,
            status: TrioStatus::Unvalidated,
        }
    }

    pub fn with_seed(mut self, seed: Uuid) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn contains(&self, competitor_id: Uuid) -> bool {
        self.members.contains(&competitor_id)
    }

    pub fn is_valid(&self) -> bool {
        self.status == TrioStatus::Valid
    }

    /// Handicap and age sums of the members, `None` if a member is missing from the roster.
    pub fn totals(&self, roster: &Roster<'_>, on: NaiveDate) -> Option<TrioTotals> {
        let mut totals = TrioTotals::default();
        for id in &self.members {
            let competitor = roster.get(*id)?;
            totals.handicap += u32::from(competitor.handicap.value());
            totals.age += competitor.age_on(on);
        }
        Some(totals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrioTotals {
    pub handicap: u32,
    pub age: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::competitor;

    #[test]
    fn test_totals() {
        let pool = vec![
            competitor(1, Sex::Male, 10, 3),
            competitor(2, Sex::Female, 12, 1),
            competitor(3, Sex::Male, 8, 7),
        ];
        let roster = Roster::new(&pool);
        let trio = Trio::new(
            1,
            CategoryKind::Aberta,
            [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)],
        );

        let totals = trio.totals(&roster, crate::fixtures::reference_date()).unwrap();
        assert_eq!(totals.handicap, 11);
        assert_eq!(totals.age, 30);
    }

    #[test]
    fn test_totals_with_missing_member() {
        let pool = vec![competitor(1, Sex::Male, 10, 3)];
        let roster = Roster::new(&pool);
        let trio = Trio::new(
            1,
            CategoryKind::Aberta,
            [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)],
        );

        assert!(trio.totals(&roster, crate::fixtures::reference_date()).is_none());
    }

    #[test]
    fn test_violation_messages() {
        let v = Violation::HandicapSumExceeded {
            total: 21,
            limit: 11,
        };
        assert_eq!(v.to_string(), "handicap sum 21 exceeds the limit of 11");

        let tv = TrioViolation {
            number: 2,
            members: [Uuid::nil(); 3],
            violation: v,
        };
        assert!(tv.to_string().starts_with("trio 2 "));
    }
}
