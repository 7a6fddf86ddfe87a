use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{CartLine, MAX_QUANTITY};

pub async fn lines(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT c.food_id, f.name, f.image, f.price, c.quantity
          FROM cart_items c
          JOIN foods f ON f.id = c.food_id
         WHERE c.user_id = $1
         ORDER BY c.added_at ASC, f.name ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("load cart")?;
    Ok(rows)
}

/// `None` when the food does not exist, otherwise its `available` flag.
pub async fn food_availability(db: &PgPool, food_id: Uuid) -> anyhow::Result<Option<bool>> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT available FROM foods WHERE id = $1")
        .bind(food_id)
        .fetch_optional(db)
        .await
        .context("check food availability")?;
    Ok(row.map(|(available,)| available))
}

pub async fn line_quantity(db: &PgPool, user_id: Uuid, food_id: Uuid) -> anyhow::Result<Option<i32>> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND food_id = $2")
            .bind(user_id)
            .bind(food_id)
            .fetch_optional(db)
            .await
            .context("load cart line")?;
    Ok(row.map(|(quantity,)| quantity))
}

/// Add `quantity` to the line, creating it if needed; the sum is capped.
pub async fn add(db: &PgPool, user_id: Uuid, food_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO cart_items (user_id, food_id, quantity)
        VALUES ($1, $2, LEAST($3, $4))
        ON CONFLICT (user_id, food_id)
        DO UPDATE SET quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $4)
        "#,
    )
    .bind(user_id)
    .bind(food_id)
    .bind(quantity)
    .bind(MAX_QUANTITY)
    .execute(db)
    .await
    .context("add cart item")?;
    Ok(())
}

pub async fn set_quantity(
    db: &PgPool,
    user_id: Uuid,
    food_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    if quantity == 0 {
        remove(db, user_id, food_id).await?;
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO cart_items (user_id, food_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, food_id)
        DO UPDATE SET quantity = EXCLUDED.quantity
        "#,
    )
    .bind(user_id)
    .bind(food_id)
    .bind(quantity)
    .execute(db)
    .await
    .context("update cart item")?;
    Ok(())
}

/// Returns whether a line was removed.
pub async fn remove(db: &PgPool, user_id: Uuid, food_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND food_id = $2")
        .bind(user_id)
        .bind(food_id)
        .execute(db)
        .await
        .context("remove cart item")?;
    Ok(res.rows_affected() > 0)
}

pub async fn clear(db: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .context("clear cart")?;
    Ok(res.rows_affected())
}
