use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    AgeLimits, CategoryKind, CategoryRules, Competitor, DrawMode, NumericConstraint, PoolBounds,
    Sex,
};

pub const MIRIM_MAX_AGE_SUM: u32 = 36;
pub const HANDICAP_MAX_SUM: u32 = 11;
pub const PARTIAL_POOL_BOUNDS: PoolBounds = PoolBounds { min: 3, max: 9 };

/// Looks up the rules of a category by identifier.
pub fn rules(category: &str) -> Result<CategoryRules> {
    let kind: CategoryKind = category.parse()?;
    Ok(rules_for(kind))
}

pub fn rules_for(kind: CategoryKind) -> CategoryRules {
    match kind {
        CategoryKind::Baby => CategoryRules {
            kind,
            draw_mode: DrawMode::FullRandom,
            required_sex: None,
            age_limits: Some(AgeLimits {
                min: None,
                max: Some(12),
            }),
        },
        CategoryKind::Kids => CategoryRules {
            kind,
            draw_mode: DrawMode::PartialRandom {
                bounds: PARTIAL_POOL_BOUNDS,
            },
            required_sex: None,
            age_limits: Some(AgeLimits {
                min: Some(13),
                max: Some(17),
            }),
        },
        CategoryKind::Mirim => CategoryRules {
            kind,
            draw_mode: DrawMode::Constrained {
                constraint: NumericConstraint::MaxAgeSum(MIRIM_MAX_AGE_SUM),
            },
            required_sex: None,
            age_limits: None,
        },
        CategoryKind::Feminina => CategoryRules {
            kind,
            draw_mode: DrawMode::PartialRandom {
                bounds: PARTIAL_POOL_BOUNDS,
            },
            required_sex: Some(Sex::Female),
            age_limits: None,
        },
        CategoryKind::Aberta => CategoryRules {
            kind,
            draw_mode: DrawMode::Unconstrained,
            required_sex: None,
            age_limits: None,
        },
        CategoryKind::Handicap => CategoryRules {
            kind,
            draw_mode: DrawMode::Constrained {
                constraint: NumericConstraint::MaxHandicapSum(HANDICAP_MAX_SUM),
            },
            required_sex: None,
            age_limits: None,
        },
    }
}

impl CategoryRules {
    /// Whether `competitor` may enter this category on `on`.
    pub fn admits(&self, competitor: &Competitor, on: NaiveDate) -> bool {
        if let Some(sex) = self.required_sex
            && competitor.sex != sex
        {
            return false;
        }

        self.age_limits
            .is_none_or(|limits| limits.contains(competitor.age_on(on)))
    }
}

/// Every category `competitor` is eligible for, aberta always included.
pub fn eligible_categories(competitor: &Competitor, on: NaiveDate) -> Vec<CategoryKind> {
    CategoryKind::all()
        .iter()
        .copied()
        .filter(|kind| rules_for(*kind).admits(competitor, on))
        .collect()
}
