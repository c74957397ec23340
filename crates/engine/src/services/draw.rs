//! Trio draws (sorteio).
//!
//! Generation and validation are kept apart: every strategy here only
//! proposes a partition, and [`validator::confirm`] decides whether it
//! leaves the engine.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FormationConfig;
use crate::error::{EngineError, Result};
use crate::models::{
    CategoryKind, CategoryRules, Competitor, DrawMode, NumericConstraint, PoolBounds, Roster,
    TRIO_SIZE, Trio, TrioViolation,
};
use crate::services::validator;

pub(crate) type Group<'a> = [&'a Competitor; TRIO_SIZE];

/// Trios produced by a draw or a seeding run, already confirmed by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub category: CategoryKind,
    pub trios: Vec<Trio>,
    /// Eligible competitors a partial draw did not pick.
    pub left_out: Vec<Uuid>,
    /// Generation trials used; always 1 outside constrained categories.
    pub attempts: usize,
}

impl DrawOutcome {
    pub fn drawn(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.trios.iter().flat_map(|trio| trio.members)
    }
}

#[derive(Debug, Clone)]
pub struct DrawEngine {
    retry_budget: usize,
}

impl DrawEngine {
    pub fn new(config: &FormationConfig) -> Self {
        Self {
            retry_budget: config.retry_budget,
        }
    }

    pub fn retry_budget(&self) -> usize {
        self.retry_budget
    }

    /// Partitions `pool` into trios for the category described by `rules`.
    ///
    /// The same pool (in the same order), rules, seed and date always give
    /// the same partition.
    pub fn draw(
        &self,
        pool: &[Competitor],
        rules: &CategoryRules,
        seed: u64,
        on: NaiveDate,
    ) -> Result<DrawOutcome> {
        ensure_distinct(pool.iter())?;

        let roster = Roster::new(pool);
        let mut rng = rng_from(seed);
        let members: Vec<&Competitor> = pool.iter().collect();

        let (mut trios, left_out, attempts) = match rules.draw_mode {
            DrawMode::FullRandom | DrawMode::Unconstrained => {
                let trio_count = partition_size(members.len())?;
                let groups = random_fill(&[], &members, trio_count, &mut rng);
                (into_trios(rules.kind, groups, 0), Vec::new(), 1)
            }
            DrawMode::PartialRandom { bounds } => {
                let mut eligible: Vec<&Competitor> = members
                    .into_iter()
                    .filter(|c| rules.required_sex.is_none_or(|sex| c.sex == sex))
                    .collect();
                let available = eligible.len();
                let size = sub_pool_size(available, bounds)?;

                eligible.shuffle(&mut rng);
                let left_out: Vec<Uuid> = eligible
                    .split_off(size)
                    .into_iter()
                    .map(|c| c.competitor_id)
                    .collect();
                debug!(
                    "Partial draw for {} picked {} of {} eligible competitor(s)",
                    rules.kind,
                    size,
                    available
                );

                let groups = random_fill(&[], &eligible, size / TRIO_SIZE, &mut rng);
                (into_trios(rules.kind, groups, 0), left_out, 1)
            }
            DrawMode::Constrained { constraint } => {
                let trio_count = partition_size(members.len())?;
                let (trios, attempts) = Balancer::new(constraint, on).search(
                    &[],
                    &members,
                    trio_count,
                    rules,
                    &roster,
                    &mut rng,
                    self.retry_budget,
                )?;
                (trios, Vec::new(), attempts)
            }
        };

        validator::confirm(&mut trios, &roster, rules, on)?;

        info!(
            "Drew {} trio(s) for {} from a pool of {} (seed {}, {} attempt(s))",
            trios.len(),
            rules.kind,
            pool.len(),
            seed,
            attempts
        );

        Ok(DrawOutcome {
            category: rules.kind,
            trios,
            left_out,
            attempts,
        })
    }
}

pub(crate) fn rng_from(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub(crate) fn ensure_distinct<'a>(competitors: impl Iterator<Item = &'a Competitor>) -> Result<()> {
    let mut seen = HashSet::new();
    for competitor in competitors {
        if !seen.insert(competitor.competitor_id) {
            return Err(EngineError::DuplicateAssignment {
                competitor_id: competitor.competitor_id,
            });
        }
    }
    Ok(())
}

/// Number of trios a full partition of `size` competitors yields.
pub(crate) fn partition_size(size: usize) -> Result<usize> {
    if size < TRIO_SIZE {
        return Err(EngineError::InsufficientPool { available: size });
    }
    if size % TRIO_SIZE != 0 {
        return Err(EngineError::IncompletePool { size });
    }
    Ok(size / TRIO_SIZE)
}

/// Largest multiple of 3 within `bounds` that `available` competitors can fill.
pub(crate) fn sub_pool_size(available: usize, bounds: PoolBounds) -> Result<usize> {
    let size = available.min(bounds.max).max(bounds.min);
    if size > available {
        return Err(EngineError::InsufficientPool { available });
    }

    let size = size - size % TRIO_SIZE;
    if size < TRIO_SIZE {
        return Err(EngineError::InsufficientPool { available });
    }
    Ok(size)
}

/// Shuffles `rest` and deals it into `trio_count` groups. Group `i` starts
/// with `anchors[i]` when one is given.
pub(crate) fn random_fill<'a, R: Rng + ?Sized>(
    anchors: &[&'a Competitor],
    rest: &[&'a Competitor],
    trio_count: usize,
    rng: &mut R,
) -> Vec<Group<'a>> {
    let mut shuffled = rest.to_vec();
    shuffled.shuffle(rng);

    let mut dealt = shuffled.into_iter();
    let mut flat = Vec::with_capacity(trio_count * TRIO_SIZE);
    for slot in 0..trio_count {
        let take = match anchors.get(slot) {
            Some(anchor) => {
                flat.push(*anchor);
                TRIO_SIZE - 1
            }
            None => TRIO_SIZE,
        };
        flat.extend(dealt.by_ref().take(take));
    }

    flat.chunks_exact(TRIO_SIZE)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect()
}

/// Numbers groups from 1; the first `seeded` groups carry their anchor as seed.
pub(crate) fn into_trios(category: CategoryKind, groups: Vec<Group<'_>>, seeded: usize) -> Vec<Trio> {
    groups
        .into_iter()
        .enumerate()
        .map(|(idx, group)| {
            let trio = Trio::new(
                idx as u32 + 1,
                category,
                group.map(|c| c.competitor_id),
            );
            if idx < seeded {
                trio.with_seed(group[0].competitor_id)
            } else {
                trio
            }
        })
        .collect()
}

/// Randomized greedy search for partitions under a per-trio sum bound.
///
/// Each trial anchors a trio on the heaviest unplaced competitor (or on a
/// pre-placed seed) and completes it with light partners. The first trial is
/// the plain greedy rule, pairing the anchor with the two lightest; later
/// trials pick a random pair that still fits the bound and fall back to the
/// two lightest when none does.
pub(crate) struct Balancer {
    constraint: NumericConstraint,
    on: NaiveDate,
}

impl Balancer {
    pub(crate) fn new(constraint: NumericConstraint, on: NaiveDate) -> Self {
        Self { constraint, on }
    }

    fn weight(&self, competitor: &Competitor) -> u32 {
        match self.constraint {
            NumericConstraint::MaxAgeSum(_) => competitor.age_on(self.on),
            NumericConstraint::MaxHandicapSum(_) => u32::from(competitor.handicap.value()),
        }
    }

    /// True when no arrangement can satisfy the bound, whatever the trial.
    fn hopeless(&self, anchors: &[&Competitor], rest: &[&Competitor], trio_count: usize) -> bool {
        let limit = self.constraint.limit();
        let mut weights: Vec<u32> = rest.iter().map(|c| self.weight(c)).collect();
        weights.sort_unstable();

        let lightest_pair = match weights.as_slice() {
            [a, b, ..] => a + b,
            _ => return false,
        };
        if anchors.iter().any(|a| self.weight(a) + lightest_pair > limit) {
            return true;
        }

        trio_count > anchors.len()
            && weights
                .get(2)
                .is_some_and(|third| lightest_pair + third > limit)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn search<'a, R: Rng + ?Sized>(
        &self,
        anchors: &[&'a Competitor],
        rest: &[&'a Competitor],
        trio_count: usize,
        rules: &CategoryRules,
        roster: &Roster<'_>,
        rng: &mut R,
        budget: usize,
    ) -> Result<(Vec<Trio>, usize)> {
        let hopeless = self.hopeless(anchors, rest, trio_count);
        let mut best: Option<Vec<TrioViolation>> = None;
        let mut attempts = 0;

        // The greedy trial runs even when `budget` is 0.
        loop {
            attempts += 1;

            let groups = self.trial(anchors, rest, trio_count, rng, attempts > 1);
            if groups.len() != trio_count {
                return Err(EngineError::IncompletePool {
                    size: anchors.len() + rest.len(),
                });
            }

            let trios = into_trios(rules.kind, groups, anchors.len());
            let found = validator::violations(&trios, roster, rules, self.on);
            if found.is_empty() {
                debug!("Trial {} satisfied every {} trio", attempts, rules.kind);
                return Ok((trios, attempts));
            }

            debug!(
                "Trial {} left {} {} trio(s) over the limit of {}",
                attempts,
                found.len(),
                rules.kind,
                self.constraint.limit()
            );
            if best.as_ref().is_none_or(|b| found.len() < b.len()) {
                best = Some(found);
            }
            if hopeless {
                debug!("Lightest possible trio already exceeds the limit, stopping early");
                break;
            }
            if attempts >= budget {
                break;
            }
        }

        Err(EngineError::ConstraintUnsatisfiable {
            category: rules.kind,
            attempts,
            violations: best.unwrap_or_default(),
        })
    }

    fn trial<'a, R: Rng + ?Sized>(
        &self,
        anchors: &[&'a Competitor],
        rest: &[&'a Competitor],
        trio_count: usize,
        rng: &mut R,
        randomized: bool,
    ) -> Vec<Group<'a>> {
        // Ascending by weight; the shuffle randomizes ties.
        let mut remaining = rest.to_vec();
        remaining.shuffle(rng);
        remaining.sort_by_key(|c| self.weight(c));

        let mut seeded: Vec<(usize, &'a Competitor)> = anchors.iter().copied().enumerate().collect();
        seeded.sort_by_key(|(_, c)| Reverse(self.weight(c)));
        let mut seeded = seeded.into_iter().peekable();

        let mut free_slots = anchors.len()..trio_count;
        let mut groups: Vec<Option<Group<'a>>> = vec![None; trio_count];

        loop {
            let seed_weight = seeded.peek().map(|(_, c)| self.weight(c));
            let free_weight = if free_slots.is_empty() {
                None
            } else {
                remaining.last().map(|c| self.weight(c))
            };

            let take_free = match (seed_weight, free_weight) {
                (Some(s), Some(f)) => f > s,
                (None, Some(_)) => true,
                (Some(_), None) => false,
                (None, None) => break,
            };

            let (slot, anchor) = if take_free {
                match (free_slots.next(), remaining.pop()) {
                    (Some(slot), Some(anchor)) => (slot, anchor),
                    _ => break,
                }
            } else {
                match seeded.next() {
                    Some(pair) => pair,
                    None => break,
                }
            };

            let Some([first, second]) = self.pick_partners(anchor, &mut remaining, rng, randomized)
            else {
                break;
            };
            groups[slot] = Some([anchor, first, second]);
        }

        groups.into_iter().flatten().collect()
    }

    fn pick_partners<'a, R: Rng + ?Sized>(
        &self,
        anchor: &Competitor,
        remaining: &mut Vec<&'a Competitor>,
        rng: &mut R,
        randomized: bool,
    ) -> Option<[&'a Competitor; 2]> {
        if remaining.len() < 2 {
            return None;
        }

        let (i, j) = if randomized {
            self.random_fitting_pair(anchor, remaining, rng)
                .unwrap_or((0, 1))
        } else {
            (0, 1)
        };

        let second = remaining.remove(j);
        let first = remaining.remove(i);
        Some([first, second])
    }

    /// Uniformly random index pair `(i, j)`, `i < j`, whose weights fit
    /// alongside `anchor`. `remaining` must be sorted by ascending weight.
    fn random_fitting_pair<R: Rng + ?Sized>(
        &self,
        anchor: &Competitor,
        remaining: &[&Competitor],
        rng: &mut R,
    ) -> Option<(usize, usize)> {
        let room = self.constraint.limit().checked_sub(self.weight(anchor))?;
        let weights: Vec<u32> = remaining.iter().map(|c| self.weight(c)).collect();

        // partners[i]: how many j > i fit with i.
        let partners: Vec<usize> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| match room.checked_sub(*w) {
                Some(left) => weights
                    .partition_point(|other| *other <= left)
                    .saturating_sub(i + 1),
                None => 0,
            })
            .collect();

        let total: usize = partners.iter().sum();
        if total == 0 {
            return None;
        }

        let mut pick = rng.random_range(0..total);
        for (i, count) in partners.into_iter().enumerate() {
            if pick < count {
                return Some((i, i + 1 + pick));
            }
            pick -= count;
        }
        None
    }
}
