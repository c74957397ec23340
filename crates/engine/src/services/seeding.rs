//! Champions Cup seeding: top-ranked competitors (cabeças de chave) are
//! spread one per trio before the rest of the pool is drawn around them.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FormationConfig;
use crate::error::{EngineError, Result};
use crate::models::{CategoryRules, Competitor, DrawMode, Roster};
use crate::services::draw::{
    Balancer, DrawOutcome, ensure_distinct, into_trios, partition_size, random_fill, rng_from,
};
use crate::services::validator;

#[derive(Debug, Clone)]
pub struct SeedingEngine {
    retry_budget: usize,
}

impl SeedingEngine {
    pub fn new(config: &FormationConfig) -> Self {
        Self {
            retry_budget: config.retry_budget,
        }
    }

    /// Forms trios from the whole `pool` with `seeds` (best rank first)
    /// anchoring trios 1..=seeds.len() in rank order.
    ///
    /// Every seed gets a trio of its own, so no two seeds ever share one.
    /// The remaining competitors fill the free slots using the category's
    /// draw strategy: balanced around the seeds for constrained categories,
    /// shuffled otherwise.
    pub fn seed(
        &self,
        pool: &[Competitor],
        seeds: &[Uuid],
        rules: &CategoryRules,
        rng_seed: u64,
        on: NaiveDate,
    ) -> Result<DrawOutcome> {
        ensure_distinct(pool.iter())?;
        let trio_count = partition_size(pool.len())?;
        if seeds.len() > trio_count {
            return Err(EngineError::TooManySeeds {
                seeds: seeds.len(),
                slots: trio_count,
            });
        }

        let roster = Roster::new(pool);
        let anchors = resolve_seeds(seeds, &roster)?;
        let seeded: HashSet<Uuid> = seeds.iter().copied().collect();
        let rest: Vec<&Competitor> = pool
            .iter()
            .filter(|c| !seeded.contains(&c.competitor_id))
            .collect();

        for (rank, anchor) in anchors.iter().enumerate() {
            debug!(
                "Seed {} ({}) anchors trio {}",
                rank + 1,
                anchor.name,
                rank + 1
            );
        }

        let mut rng = rng_from(rng_seed);
        let (mut trios, attempts) = match rules.draw_mode {
            DrawMode::Constrained { constraint } => Balancer::new(constraint, on).search(
                &anchors,
                &rest,
                trio_count,
                rules,
                &roster,
                &mut rng,
                self.retry_budget,
            )?,
            DrawMode::FullRandom | DrawMode::PartialRandom { .. } | DrawMode::Unconstrained => {
                let groups = random_fill(&anchors, &rest, trio_count, &mut rng);
                (into_trios(rules.kind, groups, anchors.len()), 1)
            }
        };

        validator::confirm(&mut trios, &roster, rules, on)?;

        info!(
            "Seeded {} trio(s) for {} with {} seed(s) (seed {}, {} attempt(s))",
            trios.len(),
            rules.kind,
            anchors.len(),
            rng_seed,
            attempts
        );

        Ok(DrawOutcome {
            category: rules.kind,
            trios,
            left_out: Vec::new(),
            attempts,
        })
    }
}

fn resolve_seeds<'a>(seeds: &[Uuid], roster: &Roster<'a>) -> Result<Vec<&'a Competitor>> {
    let mut seen = HashSet::with_capacity(seeds.len());
    seeds
        .iter()
        .map(|id| {
            if !seen.insert(*id) {
                return Err(EngineError::DuplicateAssignment { competitor_id: *id });
            }
            roster
                .get(*id)
                .ok_or(EngineError::UnknownCompetitor(*id))
        })
        .collect()
}
