//! Formation runs: `Requested -> PoolLoaded -> Partitioning -> Validated ->
//! Committed`, or `Failed` from any non-terminal state.
//!
//! The engine assumes one writer per event. Callers running concurrent
//! formations for the same event serialize them; the Trio Store's atomic
//! commit is the last line against double assignment.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::FormationConfig;
use crate::dto::{FormationReport, FormationRequest};
use crate::error::{EngineError, Result};
use crate::models::{Competitor, Roster, TRIO_SIZE, Trio, TrioViolation};
use crate::repository::{CompetitorRepository, PoolFilter, TrioStore};
use crate::services::draw::{DrawEngine, DrawOutcome};
use crate::services::rules::rules;
use crate::services::seeding::SeedingEngine;
use crate::services::validator::{self, Validation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum FormationState {
    Requested,
    PoolLoaded,
    Partitioning,
    Validated,
    Committed,
    Failed(String),
}

impl FormationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FormationState::Committed | FormationState::Failed(_))
    }

    pub fn can_transition_to(&self, next: &FormationState) -> bool {
        use FormationState::*;

        match (self, next) {
            (from, Failed(_)) => !from.is_terminal(),
            (Requested, PoolLoaded)
            | (PoolLoaded, Partitioning)
            | (Partitioning, Validated)
            | (Validated, Committed) => true,
            _ => false,
        }
    }
}

/// Walks one formation run through its states, remembering the path.
#[derive(Debug, Clone)]
pub struct FormationTracker {
    states: Vec<FormationState>,
}

impl Default for FormationTracker {
    fn default() -> Self {
        Self {
            states: vec![FormationState::Requested],
        }
    }
}

impl FormationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormationState {
        // Never empty: starts at `Requested` and only grows.
        &self.states[self.states.len() - 1]
    }

    pub fn advance(&mut self, next: FormationState) -> Result<()> {
        let current = self.state();
        if !current.can_transition_to(&next) {
            return Err(EngineError::IllegalTransition {
                from: current.clone(),
                to: next,
            });
        }
        self.states.push(next);
        Ok(())
    }

    /// Moves to `Failed`; a run that already ended keeps its terminal state.
    pub fn fail(&mut self, reason: &EngineError) {
        if !self.state().is_terminal() {
            self.states.push(FormationState::Failed(reason.to_string()));
        }
    }

    pub fn states(&self) -> &[FormationState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<FormationState> {
        self.states
    }
}

pub struct FormationService<C, T> {
    competitors: C,
    trios: T,
    draw: DrawEngine,
    seeding: SeedingEngine,
}

impl<C: CompetitorRepository, T: TrioStore> FormationService<C, T> {
    pub fn new(competitors: C, trios: T, config: &FormationConfig) -> Self {
        Self {
            competitors,
            trios,
            draw: DrawEngine::new(config),
            seeding: SeedingEngine::new(config),
        }
    }

    pub fn competitors(&self) -> &C {
        &self.competitors
    }

    pub fn trio_store(&self) -> &T {
        &self.trios
    }

    /// Draws the category's trios and commits them.
    pub async fn run_draw(&self, request: &FormationRequest) -> Result<FormationReport> {
        self.run(request, None, true).await
    }

    /// Champions Cup: `seeds` (best rank first) anchor the first trios.
    pub async fn run_seeding(
        &self,
        request: &FormationRequest,
        seeds: &[Uuid],
    ) -> Result<FormationReport> {
        self.run(request, Some(seeds), true).await
    }

    /// Dry run of a draw: stops at `Validated` and commits nothing.
    pub async fn check_feasibility(&self, request: &FormationRequest) -> Result<FormationReport> {
        self.run(request, None, false).await
    }

    pub async fn validate_candidate(
        &self,
        category: &str,
        members: &[Uuid],
        on: NaiveDate,
    ) -> Result<Validation> {
        let rules = rules(category)?;
        let found = self.competitors.fetch_competitors(members).await?;
        let roster = Roster::new(&found);

        Ok(validator::validate_members(members, &roster, &rules, on))
    }

    /// Checks a hand-picked trio for `event_id` without committing it.
    /// The trio is numbered after the trios already committed in the event.
    pub async fn create_manual(
        &self,
        event_id: Uuid,
        category: &str,
        members: [Uuid; TRIO_SIZE],
        on: NaiveDate,
    ) -> Result<Trio> {
        let rules = rules(category)?;
        let committed = self.trios.trios(event_id).await?;
        let number = committed.len() as u32 + 1;

        let validation = self.validate_candidate(category, &members, on).await?;
        if let Validation::Invalid(violation) = validation {
            return Err(EngineError::InvalidTrio(TrioViolation {
                number,
                members,
                violation,
            }));
        }

        if let Some(taken) = members
            .iter()
            .find(|id| committed.iter().any(|trio| trio.contains(**id)))
        {
            return Err(EngineError::DuplicateAssignment {
                competitor_id: *taken,
            });
        }

        let mut trio = Trio::new(number, rules.kind, members);
        trio.status = Validation::Valid.into_status();
        Ok(trio)
    }

    pub async fn commit(&self, event_id: Uuid, trios: &[Trio]) -> Result<()> {
        self.trios.commit(event_id, trios).await?;
        info!("Committed {} trio(s) to event {}", trios.len(), event_id);
        Ok(())
    }

    async fn run(
        &self,
        request: &FormationRequest,
        seeds: Option<&[Uuid]>,
        commit: bool,
    ) -> Result<FormationReport> {
        let mut tracker = FormationTracker::new();

        match self.execute(&mut tracker, request, seeds, commit).await {
            Ok(outcome) => Ok(FormationReport::new(
                request,
                tracker.into_states(),
                commit,
                outcome,
            )),
            Err(err) => {
                tracker.fail(&err);
                warn!(
                    "Formation for event {} ({}) failed after {:?}: {}",
                    request.event_id,
                    request.category,
                    tracker.states(),
                    err
                );
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut FormationTracker,
        request: &FormationRequest,
        seeds: Option<&[Uuid]>,
        commit: bool,
    ) -> Result<DrawOutcome> {
        let rules = rules(&request.category)?;
        info!(
            "Formation requested for event {} ({}, seed {})",
            request.event_id, rules.kind, request.seed
        );

        let mut filter = PoolFilter::on(request.reference_date);
        if let Some(entrants) = &request.entrants {
            filter = filter.with_entrants(entrants.clone());
        }
        let assigned = self.trios.assigned(request.event_id).await?;
        ensure_unassigned(request.entrants.iter().flatten(), &assigned)?;
        ensure_unassigned(seeds.into_iter().flatten(), &assigned)?;

        let (already_entered, pool): (Vec<Competitor>, Vec<Competitor>) = self
            .competitors
            .fetch_pool(rules.kind, &filter)
            .await?
            .into_iter()
            .partition(|c| assigned.contains(&c.competitor_id));
        if !already_entered.is_empty() {
            info!(
                "{} competitor(s) already have a trio in event {}, drawing the other {}",
                already_entered.len(),
                request.event_id,
                pool.len()
            );
        }
        tracker.advance(FormationState::PoolLoaded)?;

        tracker.advance(FormationState::Partitioning)?;
        let mut outcome = match seeds {
            Some(seeds) => self.seeding.seed(
                &pool,
                seeds,
                &rules,
                request.seed,
                request.reference_date,
            )?,
            None => self
                .draw
                .draw(&pool, &rules, request.seed, request.reference_date)?,
        };
        tracker.advance(FormationState::Validated)?;

        // Numbering continues after the trios already in the event.
        let offset = self.trios.trios(request.event_id).await?.len() as u32;
        for trio in &mut outcome.trios {
            trio.number += offset;
        }
        outcome
            .left_out
            .extend(already_entered.iter().map(|c| c.competitor_id));

        if commit {
            self.commit(request.event_id, &outcome.trios).await?;
            tracker.advance(FormationState::Committed)?;
        }

        Ok(outcome)
    }
}

/// Competitors named explicitly (entrants or seeds) must not hold a trio yet.
fn ensure_unassigned<'a>(
    mut named: impl Iterator<Item = &'a Uuid>,
    assigned: &HashSet<Uuid>,
) -> Result<()> {
    match named.find(|id| assigned.contains(*id)) {
        Some(taken) => Err(EngineError::DuplicateAssignment {
            competitor_id: *taken,
        }),
        None => Ok(()),
    }
}
