use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::FoodFilter,
    normalize::{normalize_food, NormalizeWarning},
    repo,
    repo_types::{CategoryCount, Food},
};
use crate::{error::internal, state::AppState};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_foods).post(create_food))
        .route("/categories", get(list_categories))
        .route("/:id", get(get_food))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(filter): Query<FoodFilter>,
) -> Result<Json<Vec<Food>>, (StatusCode, String)> {
    let foods = repo::list(&state.db, &filter).await.map_err(internal)?;
    Ok(Json(foods))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryCount>>, (StatusCode, String)> {
    let categories = repo::categories(&state.db).await.map_err(internal)?;
    Ok(Json(categories))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Food>, (StatusCode, String)> {
    match repo::find(&state.db, id).await {
        Ok(Some(food)) => Ok(Json(food)),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Food not found".into())),
        Err(e) => Err(internal(e)),
    }
}

/// POST /api/foods with a raw food object, shaped like a fixture entry.
#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Food>), (StatusCode, String)> {
    let normalized = normalize_food(&payload, 0, OffsetDateTime::now_utc());

    let blocking: Vec<String> = normalized
        .warnings
        .iter()
        .filter(|w| w.is_blocking())
        .map(rejection_message)
        .collect();
    if !blocking.is_empty() {
        warn!(problems = ?blocking, "rejected food payload");
        return Err((StatusCode::BAD_REQUEST, blocking.join("; ")));
    }
    for w in &normalized.warnings {
        warn!(warning = %w, "food payload repaired");
    }

    let food = repo::insert(&state.db, &normalized.food)
        .await
        .map_err(internal)?;
    info!(food_id = %food.id, name = %food.name, "food created");
    Ok((StatusCode::CREATED, Json(food)))
}

fn rejection_message(w: &NormalizeWarning) -> String {
    match w {
        NormalizeWarning::NotAnObject { .. } => "body must be a JSON object".into(),
        NormalizeWarning::MissingRequiredFields { fields, .. } => {
            format!("missing required fields: {}", fields.join(", "))
        }
        NormalizeWarning::InvalidPrice { raw, .. } => {
            format!("price must be a positive number, got {raw}")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejection_lists_missing_fields() {
        let n = normalize_food(&json!({"price": "abc"}), 0, OffsetDateTime::now_utc());
        let messages: Vec<String> = n
            .warnings
            .iter()
            .filter(|w| w.is_blocking())
            .map(rejection_message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "missing required fields: name, category".to_string(),
                "price must be a positive number, got \"abc\"".to_string(),
            ]
        );
    }
}
