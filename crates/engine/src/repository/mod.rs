//! Contracts with the collaborators around the engine. The engine only
//! reads competitors and hands finished trios, scores and rankings back.

pub mod memory;

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CategoryKind, Competitor, EventResult, Ranking, ScoreRecord, Trio};

pub use memory::{
    CollectingRankingSink, InMemoryCompetitors, InMemoryResults, InMemoryScoreStore,
    InMemoryTrioStore,
};

/// Narrows a category's pool.
#[derive(Debug, Clone)]
pub struct PoolFilter {
    /// Date ages are computed on.
    pub on: NaiveDate,
    /// Restricts the pool to these competitors when set.
    pub entrants: Option<Vec<Uuid>>,
}

impl PoolFilter {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            on: date,
            entrants: None,
        }
    }

    pub fn with_entrants(mut self, entrants: Vec<Uuid>) -> Self {
        self.entrants = Some(entrants);
        self
    }

    pub fn includes(&self, competitor_id: Uuid) -> bool {
        self.entrants
            .as_ref()
            .is_none_or(|entrants| entrants.contains(&competitor_id))
    }
}

#[async_trait::async_trait]
pub trait CompetitorRepository: Send + Sync {
    /// Competitors eligible for `category` that pass `filter`.
    async fn fetch_pool(&self, category: CategoryKind, filter: &PoolFilter) -> Result<Vec<Competitor>>;

    /// Competitors with the given ids; ids not found are skipped.
    async fn fetch_competitors(&self, ids: &[Uuid]) -> Result<Vec<Competitor>>;
}

#[async_trait::async_trait]
pub trait TrioStore: Send + Sync {
    /// Stores `trios` for `event_id` all at once, or fails with
    /// `Conflict` if any member already has a committed trio in that event.
    async fn commit(&self, event_id: Uuid, trios: &[Trio]) -> Result<()>;

    async fn trios(&self, event_id: Uuid) -> Result<Vec<Trio>>;

    /// Competitors holding a committed trio in `event_id`.
    async fn assigned(&self, event_id: Uuid) -> Result<HashSet<Uuid>>;
}

#[async_trait::async_trait]
pub trait ResultSource: Send + Sync {
    async fn results(&self, event_id: Uuid) -> Result<Vec<EventResult>>;
}

#[async_trait::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Drops every record of `event_id` and stores `records` in their place.
    async fn replace_event(&self, event_id: Uuid, records: Vec<ScoreRecord>) -> Result<()>;

    async fn records(&self) -> Result<Vec<ScoreRecord>>;
}

#[async_trait::async_trait]
pub trait RankingSink: Send + Sync {
    async fn publish(&self, ranking: &Ranking) -> Result<()>;
}
