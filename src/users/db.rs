use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::User;

pub async fn get_user(pool: &PgPool, name: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, created_at, updated_at, name
        FROM users
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn create_user(pool: &PgPool, name: &str) -> Result<User> {
    let now = Utc::now();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, created_at, updated_at, name)
        VALUES ($1, $2, $2, $3)
        RETURNING id, created_at, updated_at, name
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(now)
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, created_at, updated_at, name
        FROM users
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn count_users(pool: &PgPool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*)::bigint FROM users")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Feeds, follows and posts go with their users (ON DELETE CASCADE).
pub async fn delete_all_users(pool: &PgPool) -> Result<u64> {
    let res = sqlx::query("DELETE FROM users").execute(pool).await?;
    Ok(res.rows_affected())
}
