use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// A review embedded in its food's `reviews` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Row of the `foods` table.
#[derive(Debug, FromRow)]
pub struct FoodRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub rating: f64,
    pub total_reviews: i32,
    pub available: bool,
    pub is_popular: bool,
    pub is_special_offer: bool,
    pub reviews: Json<Vec<Review>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    pub rating: f64,
    pub total_reviews: i32,
    pub available: bool,
    pub is_popular: bool,
    pub is_special_offer: bool,
    pub reviews: Vec<Review>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<FoodRow> for Food {
    fn from(r: FoodRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            description: r.description,
            image: r.image,
            price: r.price,
            original_price: r.original_price,
            discount_percent: r.discount_percent,
            rating: r.rating,
            total_reviews: r.total_reviews,
            available: r.available,
            is_popular: r.is_popular,
            is_special_offer: r.is_special_offer,
            reviews: r.reviews.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// A normalized food ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFood {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub rating: f64,
    pub total_reviews: i32,
    pub available: bool,
    pub is_popular: bool,
    pub is_special_offer: bool,
    pub reviews: Vec<Review>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// The handful of columns shown in list views and import samples.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub price: f64,
    pub rating: f64,
    pub available: bool,
}
