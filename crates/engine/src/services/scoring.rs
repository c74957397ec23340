use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::info;
use uuid::Uuid;

use crate::config::{FormationConfig, check_discount};
use crate::error::{EngineError, Result};
use crate::models::{
    Competitor, CompetitorStats, EventResult, HandicapChampion, Period, Prova, Ranking,
    RankingEntry, RankingFilter, ScoreRecord,
};

/// Placements that earn CONTEP table points.
pub const SCORED_PLACEMENTS: u32 = 10;

/// Handicap levels in Champions Cup pick order. Level 6 does not take part.
pub const CUP_HANDICAP_ORDER: [u8; 7] = [0, 1, 2, 3, 4, 5, 7];

/// CONTEP table: 1st place earns 10 points, 10th earns 1, anything else 0.
pub fn placement_points(placement: u32) -> u32 {
    if (1..=SCORED_PLACEMENTS).contains(&placement) {
        SCORED_PLACEMENTS + 1 - placement
    } else {
        0
    }
}

/// One point per full 100 of prize money left after the discount.
/// Saturates at `u64::MAX` for amounts beyond it.
pub fn prize_points(amount: Decimal, discount: Decimal) -> u64 {
    let net = amount * (Decimal::ONE - discount);
    (net / Decimal::ONE_HUNDRED)
        .floor()
        .to_u64()
        .unwrap_or(if net.is_sign_negative() { 0 } else { u64::MAX })
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    prize_discount: Decimal,
}

impl ScoringEngine {
    pub fn new(config: &FormationConfig) -> Self {
        Self {
            prize_discount: config.prize_discount,
        }
    }

    /// Scores every result of `prova`. Each member of a placed trio gets
    /// the trio's full points.
    pub fn score_event(&self, prova: &Prova) -> Result<Vec<ScoreRecord>> {
        let discount = match prova.prize_discount {
            Some(discount) => {
                check_discount(discount)?;
                discount
            }
            None => self.prize_discount,
        };

        check_placements(&prova.results)?;

        let mut records = Vec::with_capacity(prova.results.len() * 3);
        for result in &prova.results {
            let trio = prova.trio(result.trio_number).ok_or(EngineError::UnknownTrio {
                trio_number: result.trio_number,
            })?;
            if result.prize_amount.is_sign_negative() && !result.prize_amount.is_zero() {
                return Err(EngineError::InvalidPrize {
                    trio_number: result.trio_number,
                    amount: result.prize_amount,
                });
            }

            let placement_points = placement_points(result.placement);
            let prize_points = prize_points(result.prize_amount, discount);

            records.extend(trio.members.iter().map(|member| ScoreRecord {
                competitor_id: *member,
                prova_id: prova.prova_id,
                category: prova.category,
                event_date: prova.date,
                placement: result.placement,
                placement_points,
                prize_points,
                points: u64::from(placement_points).saturating_add(prize_points),
            }));
        }

        info!(
            "Scored {} result(s) of '{}' into {} record(s)",
            prova.results.len(),
            prova.name,
            records.len()
        );

        Ok(records)
    }
}

/// Placements must run 1..=n without gaps or repeats, one result per trio.
pub fn check_placements(results: &[EventResult]) -> Result<()> {
    let mut trios = HashSet::with_capacity(results.len());
    let mut placements = HashSet::with_capacity(results.len());

    for result in results {
        if !trios.insert(result.trio_number) {
            return Err(EngineError::InvalidPlacement(format!(
                "trio {} has more than one result",
                result.trio_number
            )));
        }
        if !placements.insert(result.placement) {
            return Err(EngineError::InvalidPlacement(format!(
                "placement {} is given to more than one trio",
                result.placement
            )));
        }
    }

    let expected = results.len() as u32;
    if let Some(outlier) = placements
        .iter()
        .filter(|p| **p == 0 || **p > expected)
        .min()
    {
        return Err(EngineError::InvalidPlacement(format!(
            "placement {} breaks the sequence 1..={}",
            outlier, expected
        )));
    }

    Ok(())
}

#[derive(Default)]
struct Tally {
    total_points: u64,
    events: usize,
    best_placement: Option<u32>,
}

/// Sums matching records per competitor. Ties on points go to the
/// competitor with fewer events, then to the lower id.
pub fn rank(records: &[ScoreRecord], filter: &RankingFilter) -> Ranking {
    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();
    for record in records.iter().filter(|r| filter.matches(r)) {
        let tally = tallies.entry(record.competitor_id).or_default();
        tally.total_points = tally.total_points.saturating_add(record.points);
        tally.events += 1;
        tally.best_placement = Some(
            tally
                .best_placement
                .map_or(record.placement, |best| best.min(record.placement)),
        );
    }

    let mut ordered: Vec<(Uuid, Tally)> = tallies.into_iter().collect();
    ordered.sort_by(|(a_id, a), (b_id, b)| {
        b.total_points
            .cmp(&a.total_points)
            .then(a.events.cmp(&b.events))
            .then(a_id.cmp(b_id))
    });
    if let Some(limit) = filter.limit {
        ordered.truncate(limit);
    }

    let entries = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (competitor_id, tally))| RankingEntry {
            position: idx + 1,
            competitor_id,
            total_points: tally.total_points,
            events: tally.events,
            best_placement: tally.best_placement,
        })
        .collect();

    Ranking {
        category: filter.category,
        period: filter.period,
        entries,
    }
}

pub fn competitor_stats(
    records: &[ScoreRecord],
    competitor_id: Uuid,
    period: Option<Period>,
) -> Option<CompetitorStats> {
    let own: Vec<&ScoreRecord> = records
        .iter()
        .filter(|r| r.competitor_id == competitor_id)
        .filter(|r| period.is_none_or(|p| p.contains(r.event_date)))
        .collect();
    if own.is_empty() {
        return None;
    }

    let total_points = own.iter().fold(0u64, |sum, r| sum.saturating_add(r.points));
    let mut points_by_category: BTreeMap<_, u64> = BTreeMap::new();
    for record in &own {
        let points = points_by_category.entry(record.category).or_insert(0);
        *points = points.saturating_add(record.points);
    }

    Some(CompetitorStats {
        competitor_id,
        events: own.len(),
        total_points,
        average_points: (Decimal::from(total_points) / Decimal::from(own.len())).round_dp(2),
        best_placement: own.iter().map(|r| r.placement).min(),
        worst_placement: own.iter().map(|r| r.placement).max(),
        prize_points: own
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.prize_points)),
        points_by_category,
    })
}

/// Top scorer of each handicap level, in cup pick order. Levels with no
/// scoring competitor are skipped.
pub fn champions_by_handicap(
    records: &[ScoreRecord],
    competitors: &[Competitor],
    period: Option<Period>,
) -> Vec<HandicapChampion> {
    let ranking = rank(
        records,
        &RankingFilter {
            period,
            ..RankingFilter::default()
        },
    );
    let handicaps: HashMap<Uuid, u8> = competitors
        .iter()
        .map(|c| (c.competitor_id, c.handicap.value()))
        .collect();

    CUP_HANDICAP_ORDER
        .iter()
        .filter_map(|level| {
            ranking
                .entries
                .iter()
                .find(|entry| handicaps.get(&entry.competitor_id) == Some(level))
                .map(|entry| HandicapChampion {
                    handicap: *level,
                    competitor_id: entry.competitor_id,
                    total_points: entry.total_points,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::fixtures::{competitor, id};
    use crate::models::{CategoryKind, Sex, Trio};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn prova(results: Vec<EventResult>) -> Prova {
        Prova {
            prova_id: Uuid::from_u128(500),
            name: "Etapa 1".to_string(),
            date: date(2025, 3, 15),
            category: CategoryKind::Aberta,
            prize_discount: None,
            trios: vec![
                Trio::new(1, CategoryKind::Aberta, [id(1), id(2), id(3)]),
                Trio::new(2, CategoryKind::Aberta, [id(4), id(5), id(6)]),
                Trio::new(3, CategoryKind::Aberta, [id(7), id(8), id(9)]),
            ],
            results,
        }
    }

    fn result(trio_number: u32, placement: u32, prize: i64) -> EventResult {
        EventResult {
            trio_number,
            placement,
            prize_amount: Decimal::from(prize),
        }
    }

    fn record(competitor: u128, category: CategoryKind, on: NaiveDate, placement: u32, points: u64) -> ScoreRecord {
        ScoreRecord {
            competitor_id: id(competitor),
            prova_id: Uuid::new_v4(),
            category,
            event_date: on,
            placement,
            placement_points: placement_points(placement),
            prize_points: 0,
            points,
        }
    }

    #[test]
    fn test_contep_table() {
        assert_eq!(placement_points(1), 10);
        assert_eq!(placement_points(2), 9);
        assert_eq!(placement_points(10), 1);
        assert_eq!(placement_points(11), 0);
        assert_eq!(placement_points(0), 0);
    }

    #[test]
    fn test_prize_points() {
        let discount = Decimal::new(5, 2);
        assert_eq!(prize_points(Decimal::from(1000), discount), 9);
        assert_eq!(prize_points(Decimal::from(99), discount), 0);
        assert_eq!(prize_points(Decimal::from(2000), discount), 19);
        assert_eq!(prize_points(Decimal::from(1000), Decimal::ZERO), 10);
        assert_eq!(prize_points(Decimal::ZERO, discount), 0);
    }

    #[test]
    fn test_score_event_credits_every_member() {
        let engine = ScoringEngine::new(&FormationConfig::default());
        let records = engine
            .score_event(&prova(vec![result(2, 1, 1000), result(1, 2, 0), result(3, 3, 500)]))
            .unwrap();

        assert_eq!(records.len(), 9);
        let winners: Vec<&ScoreRecord> = records.iter().filter(|r| r.placement == 1).collect();
        assert_eq!(winners.len(), 3);
        for winner in winners {
            assert!([id(4), id(5), id(6)].contains(&winner.competitor_id));
            assert_eq!(winner.placement_points, 10);
            assert_eq!(winner.prize_points, 9);
            assert_eq!(winner.points, 19);
        }

        let third = records.iter().find(|r| r.competitor_id == id(7)).unwrap();
        assert_eq!(third.points, 8 + 4);
    }

    #[test]
    fn test_event_discount_override() {
        let engine = ScoringEngine::new(&FormationConfig::default());
        let mut event = prova(vec![result(1, 1, 1000)]);
        event.prize_discount = Some(Decimal::new(20, 2));

        let records = engine.score_event(&event).unwrap();
        assert_eq!(records[0].prize_points, 8);

        event.prize_discount = Some(Decimal::from(2));
        assert!(matches!(
            engine.score_event(&event),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_placements() {
        let engine = ScoringEngine::new(&FormationConfig::default());

        let duplicated = prova(vec![result(1, 1, 0), result(2, 1, 0)]);
        assert!(matches!(
            engine.score_event(&duplicated),
            Err(EngineError::InvalidPlacement(_))
        ));

        let gap = prova(vec![result(1, 1, 0), result(2, 3, 0)]);
        assert!(matches!(
            engine.score_event(&gap),
            Err(EngineError::InvalidPlacement(ref msg)) if msg.contains("placement 3")
        ));

        let repeated_trio = prova(vec![result(1, 1, 0), result(1, 2, 0)]);
        assert!(matches!(
            engine.score_event(&repeated_trio),
            Err(EngineError::InvalidPlacement(_))
        ));
    }

    #[test]
    fn test_unknown_trio_and_negative_prize() {
        let engine = ScoringEngine::new(&FormationConfig::default());

        assert!(matches!(
            engine.score_event(&prova(vec![result(9, 1, 0)])),
            Err(EngineError::UnknownTrio { trio_number: 9 })
        ));
        assert!(matches!(
            engine.score_event(&prova(vec![result(1, 1, -50)])),
            Err(EngineError::InvalidPrize { trio_number: 1, .. })
        ));
    }

    #[test]
    fn test_huge_prize_does_not_overflow() {
        let engine = ScoringEngine::new(&FormationConfig::default());
        let records = engine
            .score_event(&prova(vec![result(1, 1, 1_000_000_000_000)]))
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].prize_points, 9_500_000_000);
        assert_eq!(records[0].points, 9_500_000_010);

        let ranking = rank(&records, &RankingFilter::default());
        assert_eq!(ranking.entries[0].total_points, 9_500_000_010);

        assert_eq!(prize_points(Decimal::MAX, Decimal::ZERO), u64::MAX);
        let mut saturated = records.clone();
        for record in &mut saturated {
            record.prize_points = u64::MAX;
            record.points = u64::MAX;
        }
        saturated.extend(records.iter().cloned());

        let ranking = rank(&saturated, &RankingFilter::default());
        assert!(ranking.entries.iter().all(|e| e.total_points == u64::MAX));
        let stats = competitor_stats(&saturated, id(1), None).unwrap();
        assert_eq!(stats.total_points, u64::MAX);
        assert_eq!(stats.prize_points, u64::MAX);
        assert_eq!(stats.points_by_category[&CategoryKind::Aberta], u64::MAX);
    }

    #[test]
    fn test_empty_results_score_nothing() {
        let engine = ScoringEngine::new(&FormationConfig::default());
        assert!(engine.score_event(&prova(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn test_ranking_order_and_tie_breaks() {
        let on = date(2025, 4, 1);
        let records = vec![
            // id 3: 20 points over two events
            record(3, CategoryKind::Aberta, on, 1, 10),
            record(3, CategoryKind::Aberta, on, 1, 10),
            // id 2: 20 points in one event, ranks above id 3
            record(2, CategoryKind::Aberta, on, 1, 20),
            // id 1 and id 4 tie on points and events, lower id first
            record(4, CategoryKind::Aberta, on, 2, 9),
            record(1, CategoryKind::Aberta, on, 2, 9),
            // other category
            record(5, CategoryKind::Mirim, on, 1, 50),
        ];

        let ranking = rank(
            &records,
            &RankingFilter {
                category: Some(CategoryKind::Aberta),
                ..RankingFilter::default()
            },
        );
        let order: Vec<Uuid> = ranking.entries.iter().map(|e| e.competitor_id).collect();
        assert_eq!(order, vec![id(2), id(3), id(1), id(4)]);
        assert_eq!(ranking.entries[0].position, 1);
        assert_eq!(ranking.entries[1].events, 2);
        assert_eq!(ranking.entries[3].position, 4);

        let top = rank(
            &records,
            &RankingFilter {
                limit: Some(1),
                ..RankingFilter::default()
            },
        );
        assert_eq!(top.entries.len(), 1);
        assert_eq!(top.entries[0].competitor_id, id(5));
    }

    #[test]
    fn test_ranking_period_filter() {
        let records = vec![
            record(1, CategoryKind::Aberta, date(2024, 12, 31), 1, 10),
            record(1, CategoryKind::Aberta, date(2025, 1, 1), 3, 8),
            record(2, CategoryKind::Aberta, date(2025, 12, 31), 2, 9),
        ];

        let ranking = rank(
            &records,
            &RankingFilter {
                period: Period::year(2025),
                ..RankingFilter::default()
            },
        );
        assert_eq!(ranking.entries.len(), 2);
        assert_eq!(ranking.entries[0].competitor_id, id(2));
        assert_eq!(ranking.entries[1].total_points, 8);
        assert_eq!(ranking.entries[1].best_placement, Some(3));
    }

    #[test]
    fn test_competitor_stats() {
        let on = date(2025, 5, 1);
        let mut records = vec![
            record(1, CategoryKind::Aberta, on, 1, 10),
            record(1, CategoryKind::Handicap, on, 4, 7),
            record(1, CategoryKind::Aberta, on, 12, 0),
            record(2, CategoryKind::Aberta, on, 2, 9),
        ];
        records[0].prize_points = 3;

        let stats = competitor_stats(&records, id(1), None).unwrap();
        assert_eq!(stats.events, 3);
        assert_eq!(stats.total_points, 17);
        assert_eq!(stats.average_points, Decimal::new(567, 2));
        assert_eq!(stats.best_placement, Some(1));
        assert_eq!(stats.worst_placement, Some(12));
        assert_eq!(stats.prize_points, 3);
        assert_eq!(stats.points_by_category[&CategoryKind::Aberta], 10);
        assert_eq!(stats.points_by_category[&CategoryKind::Handicap], 7);

        assert!(competitor_stats(&records, id(9), None).is_none());
    }

    #[test]
    fn test_champions_follow_cup_order() {
        let competitors = vec![
            competitor(1, Sex::Male, 30, 7),
            competitor(2, Sex::Male, 30, 0),
            competitor(3, Sex::Male, 30, 0),
            competitor(4, Sex::Male, 30, 6),
            competitor(5, Sex::Male, 30, 3),
        ];
        let on = date(2025, 2, 1);
        let records = vec![
            record(1, CategoryKind::Handicap, on, 1, 10),
            record(2, CategoryKind::Handicap, on, 3, 8),
            record(3, CategoryKind::Handicap, on, 2, 9),
            record(4, CategoryKind::Handicap, on, 1, 30),
            record(5, CategoryKind::Handicap, on, 4, 7),
        ];

        let champions = champions_by_handicap(&records, &competitors, None);
        let picked: Vec<(u8, Uuid)> = champions
            .iter()
            .map(|c| (c.handicap, c.competitor_id))
            .collect();
        assert_eq!(picked, vec![(0, id(3)), (3, id(5)), (7, id(1))]);
    }
}
