pub mod category;
pub mod competitor;
pub mod prova;
pub mod roster;
pub mod score;
pub mod trio;

pub use category::{AgeLimits, CategoryKind, CategoryRules, DrawMode, NumericConstraint, PoolBounds};
pub use competitor::{Competitor, Handicap, Sex};
pub use prova::{EventResult, Prova};
pub use roster::Roster;
pub use score::{
    CompetitorStats, HandicapChampion, Period, Ranking, RankingEntry, RankingFilter, ScoreRecord,
};
pub use trio::{TRIO_SIZE, Trio, TrioStatus, TrioTotals, TrioViolation, Violation};
