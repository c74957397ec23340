use anyhow::{Context, Result};
use engine::FormationConfig;
use rust_decimal::Decimal;

/// Settings read from the environment (and `.env`). Command-line flags win.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub retry_budget: Option<usize>,
    pub prize_discount: Option<Decimal>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            retry_budget: optional_var("PENNING_RETRY_BUDGET")?
                .map(|v| v.parse())
                .transpose()
                .context("PENNING_RETRY_BUDGET must be a positive integer")?,
            prize_discount: optional_var("PENNING_PRIZE_DISCOUNT")?
                .map(|v| v.parse())
                .transpose()
                .context("PENNING_PRIZE_DISCOUNT must be a decimal such as 0.05")?,
        })
    }

    pub fn with_overrides(mut self, retry_budget: Option<usize>, prize_discount: Option<Decimal>) -> Self {
        if retry_budget.is_some() {
            self.retry_budget = retry_budget;
        }
        if prize_discount.is_some() {
            self.prize_discount = prize_discount;
        }
        self
    }

    pub fn formation_config(&self) -> Result<FormationConfig> {
        let mut config = FormationConfig::default();
        if let Some(retry_budget) = self.retry_budget {
            config = config.with_retry_budget(retry_budget);
        }
        if let Some(prize_discount) = self.prize_discount {
            config = config.with_prize_discount(prize_discount);
        }
        config.checked().context("Invalid formation settings")
    }
}

fn optional_var(key: &str) -> Result<Option<String>> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Cannot load {} env variable", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let config = Config {
            retry_budget: Some(50),
            prize_discount: None,
        }
        .with_overrides(Some(10), Some(Decimal::new(10, 2)));

        let formation = config.formation_config().unwrap();
        assert_eq!(formation.retry_budget, 10);
        assert_eq!(formation.prize_discount, Decimal::new(10, 2));
    }

    #[test]
    fn test_defaults_without_settings() {
        let formation = Config::default().formation_config().unwrap();
        assert_eq!(formation, FormationConfig::default());
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let config = Config::default().with_overrides(Some(0), None);
        assert!(config.formation_config().is_err());
    }
}
