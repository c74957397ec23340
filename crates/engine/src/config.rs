use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EngineError, Result};

pub const DEFAULT_RETRY_BUDGET: usize = 200;

/// 5% of every prize is withheld before prize points are computed.
pub fn default_prize_discount() -> Decimal {
    Decimal::new(5, 2)
}

fn default_retry_budget() -> usize {
    DEFAULT_RETRY_BUDGET
}

/// Tunables for trio formation and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FormationConfig {
    /// Maximum randomized trials for constrained partitions before giving up.
    #[validate(range(min = 1, max = 100000, message = "retry_budget must be between 1 and 100000"))]
    #[serde(default = "default_retry_budget")]
    pub retry_budget: usize,

    /// Fraction of the prize withheld before conversion to points.
    #[validate(custom(function = "validate_discount"))]
    #[serde(default = "default_prize_discount")]
    pub prize_discount: Decimal,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            prize_discount: default_prize_discount(),
        }
    }
}

impl FormationConfig {
    pub fn with_retry_budget(mut self, retry_budget: usize) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_prize_discount(mut self, prize_discount: Decimal) -> Self {
        self.prize_discount = prize_discount;
        self
    }

    /// Validated copy, the form every service expects.
    pub fn checked(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

pub(crate) fn check_discount(discount: Decimal) -> Result<()> {
    validate_discount(&discount).map_err(|_| {
        EngineError::InvalidConfig(format!(
            "prize discount {} must be in [0, 1)",
            discount
        ))
    })
}

fn validate_discount(discount: &Decimal) -> std::result::Result<(), validator::ValidationError> {
    if *discount >= Decimal::ZERO && *discount < Decimal::ONE {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_discount"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormationConfig::default();
        assert_eq!(config.retry_budget, 200);
        assert_eq!(config.prize_discount, Decimal::new(5, 2));
        assert!(config.checked().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = FormationConfig::default()
            .with_retry_budget(0)
            .checked()
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_discount_bounds() {
        assert!(
            FormationConfig::default()
                .with_prize_discount(Decimal::ONE)
                .checked()
                .is_err()
        );
        assert!(
            FormationConfig::default()
                .with_prize_discount(Decimal::new(-1, 2))
                .checked()
                .is_err()
        );
        assert!(
            FormationConfig::default()
                .with_prize_discount(Decimal::ZERO)
                .checked()
                .is_ok()
        );
        assert!(check_discount(Decimal::new(10, 2)).is_ok());
        assert!(check_discount(Decimal::new(150, 2)).is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: FormationConfig = serde_json::from_str(r#"{"retry_budget": 50}"#).unwrap();
        assert_eq!(config.retry_budget, 50);
        assert_eq!(config.prize_discount, default_prize_discount());
    }
}
