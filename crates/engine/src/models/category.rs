use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Sex;

/// Competition category a trio is formed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Baby,
    Kids,
    Mirim,
    Feminina,
    Aberta,
    Handicap,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baby => "baby",
            Self::Kids => "kids",
            Self::Mirim => "mirim",
            Self::Feminina => "feminina",
            Self::Aberta => "aberta",
            Self::Handicap => "handicap",
        }
    }

    pub fn all() -> &'static [CategoryKind] {
        &[
            Self::Baby,
            Self::Kids,
            Self::Mirim,
            Self::Feminina,
            Self::Aberta,
            Self::Handicap,
        ]
    }

    fn parse_str(s: &str) -> Result<Self, EngineError> {
        let normalized = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse_str(value)
    }
}

impl std::str::FromStr for CategoryKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper bound on a per-trio sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "limit")]
pub enum NumericConstraint {
    MaxAgeSum(u32),
    MaxHandicapSum(u32),
}

impl NumericConstraint {
    pub fn limit(&self) -> u32 {
        match self {
            Self::MaxAgeSum(limit) | Self::MaxHandicapSum(limit) => *limit,
        }
    }
}

/// Size bounds for the sub-pool picked by a partial draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBounds {
    pub min: usize,
    pub max: usize,
}

/// Individual age limits, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeLimits {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl AgeLimits {
    pub fn contains(&self, age: u32) -> bool {
        self.min.is_none_or(|min| age >= min) && self.max.is_none_or(|max| age <= max)
    }
}

/// How trios of a category are generated. One variant per draw mode,
/// carrying the parameters that mode needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DrawMode {
    FullRandom,
    PartialRandom { bounds: PoolBounds },
    Constrained { constraint: NumericConstraint },
    Unconstrained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRules {
    pub kind: CategoryKind,
    pub draw_mode: DrawMode,
    /// Categorical constraint: every member must have this sex.
    pub required_sex: Option<Sex>,
    pub age_limits: Option<AgeLimits>,
}

impl CategoryRules {
    pub fn numeric_constraint(&self) -> Option<NumericConstraint> {
        match self.draw_mode {
            DrawMode::Constrained { constraint } => Some(constraint),
            _ => None,
        }
    }

    pub fn pool_bounds(&self) -> Option<PoolBounds> {
        match self.draw_mode {
            DrawMode::PartialRandom { bounds } => Some(bounds),
            _ => None,
        }
    }
}
