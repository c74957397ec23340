use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::{Competitor, Handicap, Sex};

/// Request payload for registering a competitor
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCompetitorRequest {
    /// Kept when importing an existing registry, generated otherwise.
    #[serde(default)]
    pub competitor_id: Option<Uuid>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub birth_date: NaiveDate,

    pub sex: Sex,

    #[validate(range(max = 7, message = "Handicap must be between 0 and 7"))]
    pub handicap: u8,
}

impl CreateCompetitorRequest {
    pub fn into_competitor(self) -> Result<Competitor> {
        self.validate()?;
        Ok(Competitor {
            competitor_id: self.competitor_id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_string(),
            birth_date: self.birth_date,
            sex: self.sex,
            handicap: Handicap::new(self.handicap)?,
        })
    }
}

/// Registers every request, failing on the first invalid one.
pub fn register_all(requests: Vec<CreateCompetitorRequest>) -> Result<Vec<Competitor>> {
    requests
        .into_iter()
        .map(CreateCompetitorRequest::into_competitor)
        .collect()
}
