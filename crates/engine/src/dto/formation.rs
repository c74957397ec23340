use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CategoryKind, Trio};
use crate::services::draw::DrawOutcome;
use crate::services::formation::FormationState;

/// Request payload for a draw, a seeding run or a feasibility check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationRequest {
    pub event_id: Uuid,
    /// Category identifier, e.g. `"mirim"`.
    pub category: String,
    /// Seed of the random generator; the same seed reproduces the same trios.
    #[serde(default)]
    pub seed: u64,
    /// Date ages are computed on, usually the event date.
    pub reference_date: NaiveDate,
    /// Restricts the pool to these competitors.
    #[serde(default)]
    pub entrants: Option<Vec<Uuid>>,
}

impl FormationRequest {
    pub fn new(event_id: Uuid, category: impl Into<String>, reference_date: NaiveDate) -> Self {
        Self {
            event_id,
            category: category.into(),
            seed: 0,
            reference_date,
            entrants: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_entrants(mut self, entrants: Vec<Uuid>) -> Self {
        self.entrants = Some(entrants);
        self
    }
}

/// What a formation run did and produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationReport {
    pub event_id: Uuid,
    pub category: CategoryKind,
    pub seed: u64,
    /// Every state the run went through, `Requested` first.
    pub states: Vec<FormationState>,
    pub committed: bool,
    pub attempts: usize,
    pub trios: Vec<Trio>,
    /// Eligible competitors this run placed in no trio: those a partial
    /// draw did not pick and those already entered in the event.
    pub left_out: Vec<Uuid>,
}

impl FormationReport {
    pub fn new(
        request: &FormationRequest,
        states: Vec<FormationState>,
        committed: bool,
        outcome: DrawOutcome,
    ) -> Self {
        Self {
            event_id: request.event_id,
            category: outcome.category,
            seed: request.seed,
            states,
            committed,
            attempts: outcome.attempts,
            trios: outcome.trios,
            left_out: outcome.left_out,
        }
    }

    pub fn final_state(&self) -> Option<&FormationState> {
        self.states.last()
    }
}
