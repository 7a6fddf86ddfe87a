use anyhow::Context;
use sqlx::{postgres::PgExecutor, types::Json, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{
    dto::FoodFilter,
    repo_types::{CategoryCount, Food, FoodRow, FoodSummary, NewFood, Review},
};

const FOOD_COLUMNS: &str = "id, name, category, description, image, price, original_price, \
     discount_percent, rating, total_reviews, available, is_popular, is_special_offer, \
     reviews, created_at, updated_at";

const SUMMARY_COLUMNS: &str = "id, name, category, image, price, rating, available";

// Postgres caps a statement at 65535 bind parameters; 15 per row.
const INSERT_CHUNK: usize = 1000;

pub async fn list(db: &PgPool, filter: &FoodFilter) -> anyhow::Result<Vec<Food>> {
    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {FOOD_COLUMNS} FROM foods WHERE TRUE"));

    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(popular) = filter.popular {
        qb.push(" AND is_popular = ").push_bind(popular);
    }
    if let Some(special) = filter.special {
        qb.push(" AND is_special_offer = ").push_bind(special);
    }
    if let Some(available) = filter.available {
        qb.push(" AND available = ").push_bind(available);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
    // Byte order, independent of the database collation.
    qb.push(r#" ORDER BY category COLLATE "C" ASC, name COLLATE "C" ASC"#);

    let rows = qb
        .build_query_as::<FoodRow>()
        .fetch_all(db)
        .await
        .context("list foods")?;
    Ok(rows.into_iter().map(Food::from).collect())
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Food>> {
    let row = sqlx::query_as::<_, FoodRow>(&format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find food")?;
    Ok(row.map(Food::from))
}

pub async fn insert(db: &PgPool, food: &NewFood) -> anyhow::Result<Food> {
    let mut tx = db.begin().await.context("begin tx")?;
    let mut rows = insert_chunk(&mut tx, std::slice::from_ref(food)).await?;
    tx.commit().await.context("commit tx")?;
    rows.pop()
        .map(Food::from)
        .ok_or_else(|| anyhow::anyhow!("insert returned no row"))
}

/// Insert every food inside `tx`, in order. Returns the number of rows written.
pub async fn insert_many(tx: &mut Transaction<'_, Postgres>, foods: &[NewFood]) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for chunk in foods.chunks(INSERT_CHUNK) {
        inserted += insert_chunk(tx, chunk).await?.len() as u64;
    }
    Ok(inserted)
}

async fn insert_chunk(
    tx: &mut Transaction<'_, Postgres>,
    chunk: &[NewFood],
) -> anyhow::Result<Vec<FoodRow>> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO foods (name, category, description, image, price, original_price, \
         discount_percent, rating, total_reviews, available, is_popular, is_special_offer, \
         reviews, created_at, updated_at) ",
    );
    qb.push_values(chunk, |mut b, f| {
        b.push_bind(f.name.clone())
            .push_bind(f.category.clone())
            .push_bind(f.description.clone())
            .push_bind(f.image.clone())
            .push_bind(f.price)
            .push_bind(f.original_price)
            .push_bind(f.discount_percent)
            .push_bind(f.rating)
            .push_bind(f.total_reviews)
            .push_bind(f.available)
            .push_bind(f.is_popular)
            .push_bind(f.is_special_offer)
            .push_bind(Json(f.reviews.clone()))
            .push_bind(f.created_at)
            .push_bind(f.updated_at);
    });
    qb.push(format!(" RETURNING {FOOD_COLUMNS}"));

    qb.build_query_as::<FoodRow>()
        .fetch_all(&mut **tx)
        .await
        .context("insert foods")
}

pub async fn delete_all<'e, E: PgExecutor<'e>>(ex: E) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM foods")
        .execute(ex)
        .await
        .context("delete foods")?;
    Ok(res.rows_affected())
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM foods")
        .fetch_one(db)
        .await
        .context("count foods")?;
    Ok(n)
}

pub async fn count_popular(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM foods WHERE is_popular")
        .fetch_one(db)
        .await
        .context("count popular foods")?;
    Ok(n)
}

pub async fn count_special_offers(db: &PgPool) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM foods WHERE is_special_offer")
        .fetch_one(db)
        .await
        .context("count special offers")?;
    Ok(n)
}

pub async fn categories(db: &PgPool) -> anyhow::Result<Vec<CategoryCount>> {
    let rows = sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT category, COUNT(*) AS count
          FROM foods
         GROUP BY category
         ORDER BY category COLLATE "C" ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("count foods by category")?;
    Ok(rows)
}

/// The first `limit` foods in insertion order.
pub async fn sample(db: &PgPool, limit: i64) -> anyhow::Result<Vec<FoodSummary>> {
    let rows = sqlx::query_as::<_, FoodSummary>(&format!(
        "SELECT {SUMMARY_COLUMNS} FROM foods ORDER BY seq ASC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await
    .context("sample foods")?;
    Ok(rows)
}

/// Lock a food's reviews for update inside `tx`.
pub async fn lock_reviews(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<Option<Vec<Review>>> {
    let row: Option<(Json<Vec<Review>>,)> =
        sqlx::query_as("SELECT reviews FROM foods WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .context("lock food reviews")?;
    Ok(row.map(|(reviews,)| reviews.0))
}

pub async fn save_reviews(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    reviews: &[Review],
    rating: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE foods
           SET reviews = $2, rating = $3, total_reviews = $4, updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(Json(reviews))
    .bind(rating)
    .bind(i32::try_from(reviews.len()).unwrap_or(i32::MAX))
    .execute(&mut **tx)
    .await
    .context("save food reviews")?;
    Ok(())
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
