use tracing::info;
use uuid::Uuid;

use crate::config::FormationConfig;
use crate::error::Result;
use crate::models::{
    Competitor, CompetitorStats, HandicapChampion, Period, Prova, Ranking, RankingFilter,
    ScoreRecord,
};
use crate::repository::{RankingSink, ResultSource, ScoreStore, TrioStore};
use crate::services::scoring::{self, ScoringEngine};

/// Scores events from their committed trios and reported results, and
/// serves rankings over the stored records.
pub struct ScoringService<T, R, S> {
    trios: T,
    results: R,
    scores: S,
    engine: ScoringEngine,
}

impl<T: TrioStore, R: ResultSource, S: ScoreStore> ScoringService<T, R, S> {
    pub fn new(trios: T, results: R, scores: S, config: &FormationConfig) -> Self {
        Self {
            trios,
            results,
            scores,
            engine: ScoringEngine::new(config),
        }
    }

    pub fn score_store(&self) -> &S {
        &self.scores
    }

    /// Scores the event described by `header` and replaces its stored
    /// records. Trios and results come from the collaborators; whatever
    /// the header carries in those fields is ignored.
    pub async fn score_event(&self, header: &Prova) -> Result<Vec<ScoreRecord>> {
        let prova = Prova {
            trios: self.trios.trios(header.prova_id).await?,
            results: self.results.results(header.prova_id).await?,
            ..header.clone()
        };

        let records = self.engine.score_event(&prova)?;
        self.scores
            .replace_event(prova.prova_id, records.clone())
            .await?;

        Ok(records)
    }

    pub async fn ranking(&self, filter: &RankingFilter) -> Result<Ranking> {
        let records = self.scores.records().await?;
        Ok(scoring::rank(&records, filter))
    }

    pub async fn publish_ranking<K: RankingSink>(
        &self,
        filter: &RankingFilter,
        sink: &K,
    ) -> Result<Ranking> {
        let ranking = self.ranking(filter).await?;
        sink.publish(&ranking).await?;
        info!(
            "Published ranking with {} entr(ies) for {}",
            ranking.entries.len(),
            ranking
                .category
                .map_or_else(|| "all categories".to_string(), |c| c.to_string())
        );
        Ok(ranking)
    }

    pub async fn stats(
        &self,
        competitor_id: Uuid,
        period: Option<Period>,
    ) -> Result<Option<CompetitorStats>> {
        let records = self.scores.records().await?;
        Ok(scoring::competitor_stats(&records, competitor_id, period))
    }

    /// Champions Cup seed candidates, one per handicap level in pick order.
    pub async fn champions(
        &self,
        competitors: &[Competitor],
        period: Option<Period>,
    ) -> Result<Vec<HandicapChampion>> {
        let records = self.scores.records().await?;
        Ok(scoring::champions_by_handicap(&records, competitors, period))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::error::EngineError;
    use crate::fixtures::id;
    use crate::models::{CategoryKind, EventResult, Trio};
    use crate::repository::{
        CollectingRankingSink, InMemoryResults, InMemoryScoreStore, InMemoryTrioStore,
    };

    type Service = ScoringService<InMemoryTrioStore, InMemoryResults, InMemoryScoreStore>;

    fn header(prova_id: Uuid) -> Prova {
        Prova {
            prova_id,
            name: "Copa".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 10).unwrap(),
            category: CategoryKind::Handicap,
            prize_discount: None,
            trios: Vec::new(),
            results: Vec::new(),
        }
    }

    async fn seeded_service(prova_id: Uuid) -> Service {
        let trios = InMemoryTrioStore::new();
        trios
            .commit(
                prova_id,
                &[
                    Trio::new(1, CategoryKind::Handicap, [id(1), id(2), id(3)]),
                    Trio::new(2, CategoryKind::Handicap, [id(4), id(5), id(6)]),
                ],
            )
            .await
            .unwrap();

        let results = InMemoryResults::new();
        results
            .insert(
                prova_id,
                vec![
                    EventResult {
                        trio_number: 1,
                        placement: 2,
                        prize_amount: Decimal::ZERO,
                    },
                    EventResult {
                        trio_number: 2,
                        placement: 1,
                        prize_amount: Decimal::from(1000),
                    },
                ],
            )
            .await;

        ScoringService::new(
            trios,
            results,
            InMemoryScoreStore::default(),
            &FormationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_score_event_and_rank() {
        let prova_id = Uuid::from_u128(77);
        let service = seeded_service(prova_id).await;

        let records = service.score_event(&header(prova_id)).await.unwrap();
        assert_eq!(records.len(), 6);

        let ranking = service
            .ranking(&RankingFilter {
                category: Some(CategoryKind::Handicap),
                ..RankingFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(ranking.entries.len(), 6);
        assert_eq!(ranking.entries[0].competitor_id, id(4));
        assert_eq!(ranking.entries[0].total_points, 19);
        assert_eq!(ranking.entries[3].total_points, 9);
    }

    #[tokio::test]
    async fn test_rescoring_replaces_records() {
        let prova_id = Uuid::from_u128(78);
        let service = seeded_service(prova_id).await;

        service.score_event(&header(prova_id)).await.unwrap();
        service.score_event(&header(prova_id)).await.unwrap();

        let stats = service.stats(id(1), None).await.unwrap().unwrap();
        assert_eq!(stats.events, 1);
        assert_eq!(stats.total_points, 9);
    }

    #[tokio::test]
    async fn test_invalid_results_store_nothing() {
        let prova_id = Uuid::from_u128(79);
        let service = seeded_service(prova_id).await;
        service
            .results
            .insert(
                prova_id,
                vec![EventResult {
                    trio_number: 1,
                    placement: 2,
                    prize_amount: Decimal::ZERO,
                }],
            )
            .await;

        assert!(matches!(
            service.score_event(&header(prova_id)).await,
            Err(EngineError::InvalidPlacement(_))
        ));
        assert!(service.score_store().records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_ranking() {
        let prova_id = Uuid::from_u128(80);
        let service = seeded_service(prova_id).await;
        service.score_event(&header(prova_id)).await.unwrap();

        let sink = CollectingRankingSink::new();
        let ranking = service
            .publish_ranking(
                &RankingFilter {
                    limit: Some(3),
                    ..RankingFilter::default()
                },
                &sink,
            )
            .await
            .unwrap();

        let published = sink.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].entries, ranking.entries);
        assert_eq!(ranking.entries.len(), 3);
    }
}
