use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{CompetitorRepository, PoolFilter, RankingSink, ResultSource, ScoreStore, TrioStore};
use crate::error::{EngineError, Result};
use crate::models::{CategoryKind, Competitor, EventResult, Ranking, ScoreRecord, Trio};
use crate::services::rules::rules_for;

#[derive(Debug, Default)]
pub struct InMemoryCompetitors {
    competitors: RwLock<Vec<Competitor>>,
}

impl InMemoryCompetitors {
    pub fn new(competitors: Vec<Competitor>) -> Self {
        Self {
            competitors: RwLock::new(competitors),
        }
    }

    pub async fn insert(&self, competitor: Competitor) {
        self.competitors.write().await.push(competitor);
    }
}

#[async_trait::async_trait]
impl CompetitorRepository for InMemoryCompetitors {
    async fn fetch_pool(&self, category: CategoryKind, filter: &PoolFilter) -> Result<Vec<Competitor>> {
        let rules = rules_for(category);
        let pool: Vec<Competitor> = self
            .competitors
            .read()
            .await
            .iter()
            .filter(|c| filter.includes(c.competitor_id) && rules.admits(c, filter.on))
            .cloned()
            .collect();

        debug!("Loaded {} competitor(s) eligible for {}", pool.len(), category);
        Ok(pool)
    }

    async fn fetch_competitors(&self, ids: &[Uuid]) -> Result<Vec<Competitor>> {
        let competitors = self.competitors.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| competitors.iter().find(|c| c.competitor_id == *id))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTrioStore {
    events: RwLock<HashMap<Uuid, Vec<Trio>>>,
}

impl InMemoryTrioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TrioStore for InMemoryTrioStore {
    async fn commit(&self, event_id: Uuid, trios: &[Trio]) -> Result<()> {
        let mut events = self.events.write().await;
        let committed = events.entry(event_id).or_default();

        let mut taken: HashSet<Uuid> = committed.iter().flat_map(|t| t.members).collect();
        for trio in trios {
            for member in trio.members {
                if !taken.insert(member) {
                    return Err(EngineError::Conflict {
                        event_id,
                        competitor_id: member,
                    });
                }
            }
        }

        committed.extend_from_slice(trios);
        debug!("Committed {} trio(s) to event {}", trios.len(), event_id);
        Ok(())
    }

    async fn trios(&self, event_id: Uuid) -> Result<Vec<Trio>> {
        Ok(self
            .events
            .read()
            .await
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn assigned(&self, event_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .events
            .read()
            .await
            .get(&event_id)
            .map(|trios| trios.iter().flat_map(|t| t.members).collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryResults {
    results: RwLock<HashMap<Uuid, Vec<EventResult>>>,
}

impl InMemoryResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, event_id: Uuid, results: Vec<EventResult>) {
        self.results.write().await.insert(event_id, results);
    }
}

#[async_trait::async_trait]
impl ResultSource for InMemoryResults {
    async fn results(&self, event_id: Uuid) -> Result<Vec<EventResult>> {
        Ok(self
            .results
            .read()
            .await
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryScoreStore {
    records: RwLock<Vec<ScoreRecord>>,
}

impl InMemoryScoreStore {
    pub fn new(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait::async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn replace_event(&self, event_id: Uuid, records: Vec<ScoreRecord>) -> Result<()> {
        let mut stored = self.records.write().await;
        stored.retain(|r| r.prova_id != event_id);
        stored.extend(records);
        Ok(())
    }

    async fn records(&self) -> Result<Vec<ScoreRecord>> {
        Ok(self.records.read().await.clone())
    }
}

/// Keeps every published ranking, newest last.
#[derive(Debug, Default)]
pub struct CollectingRankingSink {
    published: RwLock<Vec<Ranking>>,
}

impl CollectingRankingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<Ranking> {
        self.published.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RankingSink for CollectingRankingSink {
    async fn publish(&self, ranking: &Ranking) -> Result<()> {
        self.published.write().await.push(ranking.clone());
        Ok(())
    }
}
