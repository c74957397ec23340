use std::collections::HashMap;

use uuid::Uuid;

use super::Competitor;

/// Id lookup over a competitor snapshot.
#[derive(Debug, Clone, Default)]
pub struct Roster<'a> {
    by_id: HashMap<Uuid, &'a Competitor>,
}

impl<'a> Roster<'a> {
    pub fn new(competitors: &'a [Competitor]) -> Self {
        Self {
            by_id: competitors
                .iter()
                .map(|c| (c.competitor_id, c))
                .collect(),
        }
    }

    pub fn get(&self, competitor_id: Uuid) -> Option<&'a Competitor> {
        self.by_id.get(&competitor_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
