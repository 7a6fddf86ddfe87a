use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foods::repo_types::Review;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReview {
    pub food_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub food_id: Uuid,
    pub rating: f64,
    pub total_reviews: usize,
    pub reviews: Vec<Review>,
}

impl ReviewSummary {
    /// Builds the summary with reviews ordered newest first.
    pub fn new(food_id: Uuid, rating: f64, mut reviews: Vec<Review>) -> Self {
        reviews.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            food_id,
            rating,
            total_reviews: reviews.len(),
            reviews,
        }
    }
}
