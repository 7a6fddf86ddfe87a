use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::foods::repo_types::FoodSummary;

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<FoodSummary>> {
    let rows = sqlx::query_as::<_, FoodSummary>(
        r#"
        SELECT f.id, f.name, f.category, f.image, f.price, f.rating, f.available
          FROM favorites fav
          JOIN foods f ON f.id = fav.food_id
         WHERE fav.user_id = $1
         ORDER BY fav.created_at DESC, f.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list favorites")?;
    Ok(rows)
}

/// `true` when the favorite was new.
pub async fn add(db: &PgPool, user_id: Uuid, food_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(
        r#"
        INSERT INTO favorites (user_id, food_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, food_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(food_id)
    .execute(db)
    .await
    .context("add favorite")?;
    Ok(res.rows_affected() > 0)
}

pub async fn remove(db: &PgPool, user_id: Uuid, food_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND food_id = $2")
        .bind(user_id)
        .bind(food_id)
        .execute(db)
        .await
        .context("remove favorite")?;
    Ok(res.rows_affected() > 0)
}
