use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo;
use crate::{
    auth::jwt::AuthUser,
    error::internal,
    foods::{self, repo_types::FoodSummary},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavorite {
    pub food_id: Uuid,
}

pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/add", post(add_favorite))
        .route("/remove/:food_id", delete(remove_favorite))
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<FoodSummary>>, (StatusCode, String)> {
    let favorites = repo::list(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(favorites))
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddFavorite>,
) -> Result<(StatusCode, Json<Vec<FoodSummary>>), (StatusCode, String)> {
    if foods::repo::find(&state.db, body.food_id)
        .await
        .map_err(internal)?
        .is_none()
    {
        return Err((StatusCode::NOT_FOUND, "Food not found".into()));
    }

    let added = repo::add(&state.db, user_id, body.food_id)
        .await
        .map_err(internal)?;
    let status = if added {
        info!(%user_id, food_id = %body.food_id, "favorite added");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let favorites = repo::list(&state.db, user_id).await.map_err(internal)?;
    Ok((status, Json(favorites)))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(food_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::remove(&state.db, user_id, food_id)
        .await
        .map_err(internal)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Not a favorite".into()))
    }
}
