use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{validate_quantity, AddToCart, CartResponse, UpdateCart},
    repo,
};
use crate::{auth::jwt::AuthUser, error::internal, state::AppState};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_item))
        .route("/update", put(update_item))
        .route("/remove/:food_id", delete(remove_item))
        .route("/clear", delete(clear_cart))
}

fn check_available(food_id: Uuid, availability: Option<bool>) -> Result<(), (StatusCode, String)> {
    match availability {
        Some(true) => Ok(()),
        Some(false) => {
            warn!(%food_id, "food unavailable");
            Err((StatusCode::CONFLICT, "Food is not available".into()))
        }
        None => Err((StatusCode::NOT_FOUND, "Food not found".into())),
    }
}

/// An unavailable food may only shrink or leave the cart, never grow in it.
fn check_update(
    availability: Option<bool>,
    current: Option<i32>,
    requested: i32,
) -> Result<(), (StatusCode, String)> {
    match availability {
        None => Err((StatusCode::NOT_FOUND, "Food not found".into())),
        Some(false) if requested > current.unwrap_or(0) => {
            Err((StatusCode::CONFLICT, "Food is not available".into()))
        }
        Some(_) => Ok(()),
    }
}

async fn load(state: &AppState, user_id: Uuid) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let lines = repo::lines(&state.db, user_id).await.map_err(internal)?;
    Ok(Json(CartResponse::from_lines(lines)))
}

#[instrument(skip(state))]
pub async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    load(&state, user_id).await
}

#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    validate_quantity(body.quantity, false).map_err(|m| (StatusCode::BAD_REQUEST, m))?;

    let availability = repo::food_availability(&state.db, body.food_id)
        .await
        .map_err(internal)?;
    check_available(body.food_id, availability)?;

    repo::add(&state.db, user_id, body.food_id, body.quantity)
        .await
        .map_err(internal)?;
    info!(%user_id, food_id = %body.food_id, quantity = body.quantity, "cart item added");
    load(&state, user_id).await
}

#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<UpdateCart>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    validate_quantity(body.quantity, true).map_err(|m| (StatusCode::BAD_REQUEST, m))?;

    let availability = repo::food_availability(&state.db, body.food_id)
        .await
        .map_err(internal)?;
    let current = repo::line_quantity(&state.db, user_id, body.food_id)
        .await
        .map_err(internal)?;
    check_update(availability, current, body.quantity)?;

    repo::set_quantity(&state.db, user_id, body.food_id, body.quantity)
        .await
        .map_err(internal)?;
    load(&state, user_id).await
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(food_id): Path<Uuid>,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    if !repo::remove(&state.db, user_id, food_id).await.map_err(internal)? {
        return Err((StatusCode::NOT_FOUND, "Item not in cart".into()));
    }
    load(&state, user_id).await
}

#[instrument(skip(state))]
pub async fn clear_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CartResponse>, (StatusCode, String)> {
    let removed = repo::clear(&state.db, user_id).await.map_err(internal)?;
    info!(%user_id, removed, "cart cleared");
    load(&state, user_id).await
}
