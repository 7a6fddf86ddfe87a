use serde::Deserialize;

/// Query string accepted by `GET /api/foods`.
#[derive(Debug, Default, Deserialize)]
pub struct FoodFilter {
    pub category: Option<String>,
    pub popular: Option<bool>,
    pub special: Option<bool>,
    pub available: Option<bool>,
    pub search: Option<String>,
}
