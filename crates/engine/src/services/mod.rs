pub mod draw;
pub mod event_scoring;
pub mod formation;
pub mod rules;
pub mod scoring;
pub mod seeding;
pub mod validator;

pub use draw::{DrawEngine, DrawOutcome};
pub use event_scoring::ScoringService;
pub use formation::{FormationService, FormationState, FormationTracker};
pub use rules::{eligible_categories, rules, rules_for};
pub use scoring::{
    ScoringEngine, champions_by_handicap, competitor_stats, placement_points, prize_points, rank,
};
pub use seeding::SeedingEngine;
pub use validator::Validation;
