use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{
    CategoryRules, Competitor, NumericConstraint, Roster, TRIO_SIZE, Trio, TrioStatus,
    TrioViolation, Violation,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "violation", rename_all = "snake_case")]
pub enum Validation {
    Valid,
    Invalid(Violation),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    pub fn into_status(self) -> TrioStatus {
        match self {
            Validation::Valid => TrioStatus::Valid,
            Validation::Invalid(violation) => TrioStatus::Invalid(violation),
        }
    }
}

/// Checks resolved members against the category's categorical and numeric rules.
///
/// Pure: the same members, rules and date always give the same answer.
pub fn validate(members: &[&Competitor], rules: &CategoryRules, on: NaiveDate) -> Validation {
    if members.len() != TRIO_SIZE {
        return Validation::Invalid(Violation::WrongSize {
            found: members.len(),
        });
    }

    let mut seen = HashSet::with_capacity(TRIO_SIZE);
    for competitor in members {
        if !seen.insert(competitor.competitor_id) {
            return Validation::Invalid(Violation::DuplicateMember {
                competitor_id: competitor.competitor_id,
            });
        }
    }

    if let Some(required) = rules.required_sex
        && let Some(outsider) = members.iter().find(|c| c.sex != required)
    {
        return Validation::Invalid(Violation::SexMismatch {
            competitor_id: outsider.competitor_id,
            required,
        });
    }

    match rules.numeric_constraint() {
        Some(NumericConstraint::MaxAgeSum(limit)) => {
            let total: u32 = members.iter().map(|c| c.age_on(on)).sum();
            if total > limit {
                return Validation::Invalid(Violation::AgeSumExceeded { total, limit });
            }
        }
        Some(NumericConstraint::MaxHandicapSum(limit)) => {
            let total: u32 = members
                .iter()
                .map(|c| u32::from(c.handicap.value()))
                .sum();
            if total > limit {
                return Validation::Invalid(Violation::HandicapSumExceeded { total, limit });
            }
        }
        None => {}
    }

    Validation::Valid
}

/// Resolves `ids` against the roster, then validates.
pub fn validate_members(
    ids: &[Uuid],
    roster: &Roster<'_>,
    rules: &CategoryRules,
    on: NaiveDate,
) -> Validation {
    if ids.len() != TRIO_SIZE {
        return Validation::Invalid(Violation::WrongSize { found: ids.len() });
    }

    let mut members = Vec::with_capacity(TRIO_SIZE);
    for id in ids {
        match roster.get(*id) {
            Some(competitor) => members.push(competitor),
            None => {
                return Validation::Invalid(Violation::UnknownMember { competitor_id: *id });
            }
        }
    }

    validate(&members, rules, on)
}

pub fn validate_trio(
    trio: &Trio,
    roster: &Roster<'_>,
    rules: &CategoryRules,
    on: NaiveDate,
) -> Validation {
    validate_members(&trio.members, roster, rules, on)
}

/// Every violation in a candidate partition, in trio order.
pub fn violations(
    trios: &[Trio],
    roster: &Roster<'_>,
    rules: &CategoryRules,
    on: NaiveDate,
) -> Vec<TrioViolation> {
    trios
        .iter()
        .filter_map(|trio| match validate_trio(trio, roster, rules, on) {
            Validation::Valid => None,
            Validation::Invalid(violation) => Some(TrioViolation {
                number: trio.number,
                members: trio.members,
                violation,
            }),
        })
        .collect()
}

/// Final gate before a partition leaves the engine: stamps each trio's
/// status and fails on the first invalid trio. A competitor appearing in
/// two trios is reported as a duplicate assignment.
pub fn confirm(
    trios: &mut [Trio],
    roster: &Roster<'_>,
    rules: &CategoryRules,
    on: NaiveDate,
) -> Result<()> {
    let mut assigned = HashSet::new();

    for trio in trios.iter_mut() {
        for id in &trio.members {
            if !assigned.insert(*id) {
                return Err(EngineError::DuplicateAssignment { competitor_id: *id });
            }
        }

        let validation = validate_trio(trio, roster, rules, on);
        trio.status = validation.clone().into_status();

        if let Validation::Invalid(violation) = validation {
            return Err(EngineError::InvalidTrio(TrioViolation {
                number: trio.number,
                members: trio.members,
                violation,
            }));
        }
    }

    Ok(())
}
