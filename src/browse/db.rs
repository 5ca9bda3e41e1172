use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::PostForUser;

/// Newest posts first; posts without a publish date sort last.
pub async fn posts_for_user(pool: &PgPool, user_id: Uuid, limit: i64) -> Result<Vec<PostForUser>> {
    let rows = sqlx::query_as::<_, PostForUser>(
        r#"
        SELECT f.name AS feed_name, p.title, p.url, p.description, p.published_at
        FROM posts p
        JOIN feed_follows ff ON ff.feed_id = p.feed_id
        JOIN feeds f ON f.id = p.feed_id
        WHERE ff.user_id = $1
        ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
