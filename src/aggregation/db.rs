use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{FeedStore, InsertPostError, PostStore};
use super::types::{Feed, NewPost, Post};

const UNIQUE_VIOLATION: &str = "23505";
const POSTS_URL_KEY: &str = "posts_url_key";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl FeedStore for PgStore {
    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, user_id, last_fetched_at
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE feeds
            SET last_fetched_at = $2, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(feed_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, InsertPostError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, updated_at, title, url, description, published_at, feed_id
            "#,
        )
        .bind(post.id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .bind(&post.title)
        .bind(&post.url)
        .bind(post.description.as_deref())
        .bind(post.published_at)
        .bind(post.feed_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify_insert_error)
    }
}

/// Only a unique violation on the post URL counts as a duplicate.
fn classify_insert_error(err: sqlx::Error) -> InsertPostError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) && db_err.constraint() == Some(POSTS_URL_KEY) {
            return InsertPostError::DuplicateUrl;
        }
    }
    InsertPostError::Store(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_store_errors() {
        let err = classify_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, InsertPostError::Store(_)));
    }

    #[test]
    fn pool_timeout_is_store_error() {
        let err = classify_insert_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, InsertPostError::Store(_)));
    }
}
