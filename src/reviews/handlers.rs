use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AddReview, ReviewSummary},
    services::{average_rating, validate_review},
};
use crate::{
    auth::{jwt::AuthUser, repo_types::User},
    error::internal,
    foods::{repo, repo_types::Review},
    state::AppState,
};

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(add_review))
        .route("/food/:food_id", get(food_reviews))
}

#[instrument(skip(state, body))]
pub async fn add_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddReview>,
) -> Result<(StatusCode, Json<ReviewSummary>), (StatusCode, String)> {
    let comment = validate_review(body.rating, body.comment.as_deref()).map_err(|m| {
        warn!(%user_id, reason = %m, "review rejected");
        (StatusCode::BAD_REQUEST, m)
    })?;

    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err((StatusCode::UNAUTHORIZED, "User not found".into())),
        Err(e) => return Err(internal(e)),
    };

    let mut tx = state
        .db
        .begin()
        .await
        .context("begin tx")
        .map_err(internal)?;

    let Some(mut reviews) = repo::lock_reviews(&mut tx, body.food_id)
        .await
        .map_err(internal)?
    else {
        return Err((StatusCode::NOT_FOUND, "Food not found".into()));
    };

    reviews.push(Review {
        user_id: Some(user.id),
        user_name: Some(user.name),
        rating: f64::from(body.rating),
        comment,
        date: OffsetDateTime::now_utc(),
    });
    let rating = average_rating(&reviews);

    repo::save_reviews(&mut tx, body.food_id, &reviews, rating)
        .await
        .map_err(internal)?;
    tx.commit().await.context("commit tx").map_err(internal)?;

    info!(%user_id, food_id = %body.food_id, rating, total = reviews.len(), "review added");
    Ok((
        StatusCode::CREATED,
        Json(ReviewSummary::new(body.food_id, rating, reviews)),
    ))
}

#[instrument(skip(state))]
pub async fn food_reviews(
    State(state): State<AppState>,
    Path(food_id): Path<Uuid>,
) -> Result<Json<ReviewSummary>, (StatusCode, String)> {
    match repo::find(&state.db, food_id).await {
        Ok(Some(food)) => Ok(Json(ReviewSummary::new(food.id, food.rating, food.reviews))),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Food not found".into())),
        Err(e) => Err(internal(e)),
    }
}
