use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Rating;

/// Details the language model infers from a title and the accumulated comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub platform: String,
    pub rating: Rating,
    pub release_date: Option<NaiveDate>,
    /// Minutes; 0 when the model did not say
    pub running_time: u32,
    pub cast_crew: String,
}
