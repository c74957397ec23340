pub mod competitor;
pub mod formation;

pub use competitor::{CreateCompetitorRequest, register_all};
pub use formation::{FormationReport, FormationRequest};
