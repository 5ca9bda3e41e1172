use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::{FeedRow, FeedWithCreator, FollowedFeed};

const UNIQUE_VIOLATION: &str = "23505";

pub async fn create_feed(pool: &PgPool, name: &str, url: &str, user_id: Uuid) -> Result<Option<FeedRow>> {
    let now = Utc::now();
    let res = sqlx::query_as::<_, FeedRow>(
        r#"
        INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
        VALUES ($1, $2, $2, $3, $4, $5)
        RETURNING id, created_at, updated_at, name, url, user_id, last_fetched_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(name)
    .bind(url)
    .bind(user_id)
    .fetch_one(pool)
    .await;
    match res {
        Ok(feed) => Ok(Some(feed)),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_feeds(pool: &PgPool) -> Result<Vec<FeedWithCreator>> {
    let rows = sqlx::query_as::<_, FeedWithCreator>(
        r#"
        SELECT f.name, f.url, u.name AS user_name
        FROM feeds f
        JOIN users u ON u.id = f.user_id
        ORDER BY f.created_at
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_feed_by_url(pool: &PgPool, url: &str) -> Result<Option<FeedRow>> {
    let feed = sqlx::query_as::<_, FeedRow>(
        r#"
        SELECT id, created_at, updated_at, name, url, user_id, last_fetched_at
        FROM feeds
        WHERE url = $1
        "#,
    )
    .bind(url)
    .fetch_optional(pool)
    .await?;
    Ok(feed)
}

/// Returns false when the follow already exists.
pub async fn create_feed_follow(pool: &PgPool, user_id: Uuid, feed_id: Uuid) -> Result<bool> {
    let now = Utc::now();
    let res = sqlx::query(
        r#"
        INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
        VALUES ($1, $2, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(user_id)
    .bind(feed_id)
    .execute(pool)
    .await;
    match res {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub async fn follows_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<FollowedFeed>> {
    let rows = sqlx::query_as::<_, FollowedFeed>(
        r#"
        SELECT f.name AS feed_name, f.url AS feed_url
        FROM feed_follows ff
        JOIN feeds f ON f.id = ff.feed_id
        WHERE ff.user_id = $1
        ORDER BY ff.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn delete_feed_follow(pool: &PgPool, user_id: Uuid, feed_id: Uuid) -> Result<u64> {
    let res = sqlx::query("DELETE FROM feed_follows WHERE user_id = $1 AND feed_id = $2")
        .bind(user_id)
        .bind(feed_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}
