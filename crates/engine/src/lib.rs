pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

#[cfg(test)]
mod fixtures;

pub use config::FormationConfig;
pub use error::{EngineError, Result};
pub use repository::{CompetitorRepository, RankingSink, ResultSource, ScoreStore, TrioStore};
pub use services::{
    DrawEngine, DrawOutcome, FormationService, FormationState, ScoringEngine, ScoringService,
    SeedingEngine, Validation,
};
