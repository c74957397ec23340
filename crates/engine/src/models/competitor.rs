use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

pub const MIN_HANDICAP: u8 = 0;
pub const MAX_HANDICAP: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "F", alias = "f")]
    Female,
    #[serde(rename = "M", alias = "m")]
    Male,
}

/// Skill offset assigned to a competitor, always within 0..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Handicap(u8);

impl Handicap {
    pub fn new(value: u8) -> Result<Self, EngineError> {
        if (MIN_HANDICAP..=MAX_HANDICAP).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EngineError::HandicapOutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Handicap {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Handicap> for u8 {
    fn from(handicap: Handicap) -> Self {
        handicap.0
    }
}

/// Read-only snapshot of a registered competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub competitor_id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub handicap: Handicap,
}

impl Competitor {
    /// Age in whole years on `on`. A birth date after `on` yields 0.
    pub fn age_on(&self, on: NaiveDate) -> u32 {
        let mut years = on.year() - self.birth_date.year();
        if (on.month(), on.day()) < (self.birth_date.month(), self.birth_date.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }

    pub fn is_female(&self) -> bool {
        self.sex == Sex::Female
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competitor(birth_date: NaiveDate) -> Competitor {
        Competitor {
            competitor_id: Uuid::from_u128(1),
            name: "Ana".to_string(),
            birth_date,
            sex: Sex::Female,
            handicap: Handicap::new(2).unwrap(),
        }
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let c = competitor(NaiveDate::from_ymd_opt(2010, 6, 15).unwrap());

        assert_eq!(c.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), 13);
        assert_eq!(c.age_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), 14);
        assert_eq!(c.age_on(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 14);
    }

    #[test]
    fn test_age_of_unborn_competitor_is_zero() {
        let c = competitor(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(c.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 0);
    }

    #[test]
    fn test_handicap_bounds() {
        assert!(Handicap::new(0).is_ok());
        assert!(Handicap::new(7).is_ok());
        assert!(matches!(
            Handicap::new(8),
            Err(EngineError::HandicapOutOfRange(8))
        ));
    }

    #[test]
    fn test_handicap_rejected_on_deserialize() {
        let json = r#"{
            "competitor_id": "00000000-0000-0000-0000-000000000001",
            "name": "Bia",
            "birth_date": "2001-02-03",
            "sex": "F",
            "handicap": 9
        }"#;

        assert!(serde_json::from_str::<Competitor>(json).is_err());
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(serde_json::from_str::<Sex>(r#""F""#).unwrap(), Sex::Female);
        assert_eq!(serde_json::from_str::<Sex>(r#""m""#).unwrap(), Sex::Male);
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), r#""M""#);
    }
}
