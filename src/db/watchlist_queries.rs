use sqlx::PgPool;
use uuid::Uuid;

use crate::models::WatchlistEntry;

/// Adds `symbol` to a user's watchlist; `None` when it is already there
pub async fn add_symbol(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<WatchlistEntry>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistEntry>(
        r#"
        INSERT INTO user_watchlist (user_id, symbol)
        VALUES ($1, $2)
        ON CONFLICT (user_id, symbol) DO NOTHING
        RETURNING user_id, symbol, added_at
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<WatchlistEntry>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistEntry>(
        r#"
        SELECT user_id, symbol, added_at
        FROM user_watchlist
        WHERE user_id = $1
        ORDER BY added_at ASC, symbol ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
